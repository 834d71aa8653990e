#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
pub mod codec;
pub mod content;
pub mod data;
pub mod model;
pub mod session;
