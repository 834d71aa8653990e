//! Static screening content shared by any front end: the ten question texts
//! and the human-facing display labels for raw encoder values. The wording
//! comes from the original Indonesian instrument.

use crate::data::ItemKey;

/// The ten Q-Chat-10 questions, in item order.
pub const QUESTIONS: [&str; 10] = [
    "Apakah anak Anda melihat Anda ketika Anda memanggil namanya?",
    "Seberapa mudah bagi Anda untuk mendapatkan kontak mata dengan anak Anda?",
    "Apakah anak Anda menunjuk untuk menunjukkan bahwa ia menginginkan sesuatu?",
    "Apakah anak Anda menunjuk untuk berbagi minat dengan Anda?",
    "Apakah anak Anda berpura-pura (misalnya, merawat boneka)?",
    "Apakah anak Anda mengikuti ke mana Anda melihat?",
    "Jika Anda sedih, apakah anak Anda menunjukkan tanda-tanda ingin menghibur?",
    "Apakah Anda akan mendeskripsikan kata-kata pertama anak Anda sebagai 'biasa'?",
    "Apakah anak Anda menggunakan gerakan sederhana (misalnya, melambaikan tangan)?",
    "Apakah anak Anda menatap ke hal yang tidak ada tanpa tujuan yang jelas?",
];

/// Question text for one item.
pub fn question_text(item: ItemKey) -> &'static str {
    QUESTIONS[item.slot()]
}

/// Display label for a fitted sex-encoder value.
pub fn display_sex(value: &str) -> &str {
    match value {
        "F" => "Perempuan",
        "M" => "Laki-laki",
        other => other,
    }
}

/// Display label for a yes/no encoder value.
pub fn display_yes_no(value: &str) -> &str {
    match value {
        "Yes" => "Iya",
        "No" => "Tidak",
        other => other,
    }
}

/// Chart category name for the positive outcome bar.
pub const POSITIVE_BAR_LABEL: &str = "Iya (Tanda ASD)";
/// Chart category name for the negative outcome bar.
pub const NEGATIVE_BAR_LABEL: &str = "Tidak (Non-ASD)";

/// Shown with every positive result; the screening is not a diagnosis.
pub const DISCLAIMER: &str = "Harap dicatat bahwa ini bukan diagnosis medis. \
Silakan berkonsultasi dengan profesional kesehatan anak atau psikolog untuk \
evaluasi lebih lanjut.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_item_has_a_question() {
        for item in ItemKey::all() {
            assert!(!question_text(item).is_empty());
        }
    }

    #[test]
    fn display_labels_fall_back_to_the_raw_value() {
        assert_eq!(display_sex("F"), "Perempuan");
        assert_eq!(display_yes_no("Yes"), "Iya");
        assert_eq!(display_yes_no("Other"), "Other");
    }
}
