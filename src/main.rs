//! Terminal front end for the Q-Chat-10 screening flow.
//!
//! Loads the trained model artifact once at startup (and refuses to run
//! without it), then drives a single [`Session`] through the three steps:
//! demographic form, questionnaire, result with a text probability chart.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use qchat::codec::Prediction;
use qchat::content;
use qchat::data::{
    ADMINISTRATOR_VALUES, Answers, Demographics, ETHNICITY_VALUES, ItemKey, MAX_AGE_MONTHS,
    MIN_AGE_MONTHS, OrdinalAnswer,
};
use qchat::model::{Predictor, ScreeningModel};
use qchat::session::{Page, Session};

/// Q-Chat-10 toddler ASD screening, as a terminal questionnaire.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the trained model artifact (TOML).
    #[arg(long, default_value = "svm_model.toml")]
    model: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let model = match ScreeningModel::load(&cli.model) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(err) = run(&model, &mut stdin.lock()) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// What the questionnaire screen produced.
enum SheetOutcome {
    Completed(Answers),
    Back,
}

fn run(model: &ScreeningModel, input: &mut impl BufRead) -> io::Result<()> {
    let mut session = Session::new();
    println!("Prediksi Spektrum Autisme (ASD) pada Anak");

    loop {
        match session.page() {
            Page::Demographics => {
                let Some(record) = collect_demographics(model, input)? else {
                    return Ok(());
                };
                if let Err(err) = session.submit_demographics(record, model) {
                    println!("{err}");
                }
            }
            Page::Questionnaire => match collect_answers(input)? {
                None => return Ok(()),
                Some(SheetOutcome::Back) => {
                    if let Err(err) = session.go_back() {
                        println!("{err}");
                    }
                }
                Some(SheetOutcome::Completed(answers)) => {
                    if let Err(err) = session.submit_questionnaire(&answers, model) {
                        println!("Terjadi kesalahan saat melakukan prediksi: {err}");
                    }
                }
            },
            Page::Result => {
                // This unwrap is safe: the result page implies a stored prediction.
                render_result(session.result().unwrap());
                let Some(line) = read_line(input, "\nIsi ulang kuesioner? (y/t) ")? else {
                    return Ok(());
                };
                if line.eq_ignore_ascii_case("y") {
                    session.reset();
                    println!();
                } else {
                    return Ok(());
                }
            }
        }
    }
}

fn collect_demographics(
    model: &ScreeningModel,
    input: &mut impl BufRead,
) -> io::Result<Option<Demographics>> {
    println!("\nLangkah 1: Latar Belakang Kondisi Anak");
    let encoders = model.encoders();

    let Some(age_months) = prompt_age(input)? else {
        return Ok(None);
    };
    let Some(sex) = prompt_choice(
        input,
        "Jenis Kelamin",
        encoders.sex.known_values(),
        content::display_sex,
    )?
    else {
        return Ok(None);
    };
    let Some(jaundice) = prompt_choice(
        input,
        "Riwayat Penyakit Kuning (Jaundice)",
        encoders.jaundice.known_values(),
        content::display_yes_no,
    )?
    else {
        return Ok(None);
    };
    let Some(family_asd) = prompt_choice(
        input,
        "Riwayat ASD dalam Keluarga",
        encoders.family_asd.known_values(),
        content::display_yes_no,
    )?
    else {
        return Ok(None);
    };
    let Some(ethnicity) = prompt_choice(input, "Etnis", &ETHNICITY_VALUES, |value| value)? else {
        return Ok(None);
    };
    let Some(who_completed) =
        prompt_choice(input, "Siapa yang Mengisi Tes?", &ADMINISTRATOR_VALUES, |value| value)?
    else {
        return Ok(None);
    };

    Ok(Some(Demographics {
        age_months,
        sex,
        jaundice,
        family_asd,
        ethnicity,
        who_completed,
    }))
}

fn collect_answers(input: &mut impl BufRead) -> io::Result<Option<SheetOutcome>> {
    println!("\nLangkah 2: Kuesioner Q-Chat-10");
    println!("Jawab dengan nomor 1-5, atau 'k' untuk kembali ke Langkah 1.");

    let mut answers = Answers::new();
    for item in ItemKey::all() {
        println!("\n{item}: {}", content::question_text(item));
        for (position, answer) in OrdinalAnswer::ALL.iter().enumerate() {
            println!("  {}. {}", position + 1, answer.label());
        }
        loop {
            let Some(line) = read_line(input, "> ")? else {
                return Ok(None);
            };
            if line.eq_ignore_ascii_case("k") {
                return Ok(Some(SheetOutcome::Back));
            }
            match line.parse::<usize>() {
                Ok(choice) if (1..=OrdinalAnswer::ALL.len()).contains(&choice) => {
                    answers.set(item, OrdinalAnswer::ALL[choice - 1]);
                    break;
                }
                _ => println!(
                    "Masukkan nomor antara 1 dan {}, atau 'k'.",
                    OrdinalAnswer::ALL.len()
                ),
            }
        }
    }
    Ok(Some(SheetOutcome::Completed(answers)))
}

fn prompt_age(input: &mut impl BufRead) -> io::Result<Option<u32>> {
    loop {
        let prompt = format!("Usia (dalam bulan, {MIN_AGE_MONTHS}-{MAX_AGE_MONTHS}): ");
        let Some(line) = read_line(input, &prompt)? else {
            return Ok(None);
        };
        match line.parse::<u32>() {
            Ok(age) if (MIN_AGE_MONTHS..=MAX_AGE_MONTHS).contains(&age) => {
                return Ok(Some(age));
            }
            _ => println!("Masukkan angka antara {MIN_AGE_MONTHS} dan {MAX_AGE_MONTHS}."),
        }
    }
}

fn prompt_choice<S: AsRef<str>>(
    input: &mut impl BufRead,
    label: &str,
    options: &[S],
    display: impl Fn(&str) -> &str,
) -> io::Result<Option<String>> {
    println!("{label}:");
    for (position, option) in options.iter().enumerate() {
        println!("  {}. {}", position + 1, display(option.as_ref()));
    }
    loop {
        let Some(line) = read_line(input, "> ")? else {
            return Ok(None);
        };
        match line.parse::<usize>() {
            Ok(choice) if (1..=options.len()).contains(&choice) => {
                return Ok(Some(options[choice - 1].as_ref().to_string()));
            }
            _ => println!("Masukkan nomor antara 1 dan {}.", options.len()),
        }
    }
}

/// Prompts and reads one trimmed line; `None` on end of input.
fn read_line(input: &mut impl BufRead, prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn render_result(prediction: &Prediction) {
    println!("\nHasil Prediksi Model (SVM Linear)");
    if prediction.is_positive() {
        println!("Prediksi: Terdeteksi Tanda-Tanda ASD (Iya)");
        println!(
            "Model memiliki keyakinan {:.2}% bahwa terdapat tanda-tanda ASD.",
            prediction.proba_yes * 100.0
        );
        println!("{}", content::DISCLAIMER);
    } else {
        println!("Prediksi: Tidak Terdeteksi Tanda-Tanda ASD (Tidak)");
        println!(
            "Model memiliki keyakinan {:.2}% bahwa tidak terdapat tanda-tanda ASD.",
            prediction.proba_no * 100.0
        );
    }

    println!("\nProbabilitas Hasil Prediksi");
    render_bar(content::NEGATIVE_BAR_LABEL, prediction.proba_no);
    render_bar(content::POSITIVE_BAR_LABEL, prediction.proba_yes);
}

fn render_bar(label: &str, probability: f64) {
    let filled = (probability * 40.0).round() as usize;
    println!("{label:>16} | {} {:.1}%", "#".repeat(filled), probability * 100.0);
}
