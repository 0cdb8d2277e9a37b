use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::warn;

use pinyin_lm::dict::{DictError, SyllableTable, Vocabulary};
use pinyin_lm::eval::score_lines;
use pinyin_lm::model::{Model, ModelConfig, ModelError, ModelStats};
use pinyin_lm::ngram::{read_header, NGramCounts};
use pinyin_lm::settings::{self, Settings};
use pinyin_lm::symbol::SymbolMode;
use pinyin_lm::train::PinyinOracle;
use pinyin_lm::trace_init::init_tracing;
use pinyin_lm::Interpolation;

/// Unwrap a Result or print the error and exit.
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "pinyintool", about = "Pinyin n-gram model training and conversion")]
struct Cli {
    /// Settings TOML replacing the embedded defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

/// Reference files and model hyperparameters; unset flags fall back to settings.
#[derive(clap::Args)]
struct ModelArgs {
    /// Vocabulary file (all characters, one string)
    #[arg(long)]
    vocab: Option<PathBuf>,
    /// Syllable table file (`syllable char char ...` per line)
    #[arg(long)]
    syllables: Option<PathBuf>,
    /// Bigram weight
    #[arg(long)]
    alpha: Option<f64>,
    /// Trigram weight
    #[arg(long)]
    beta: Option<f64>,
    /// Disable beam pruning
    #[arg(long)]
    no_pruning: bool,
    /// Key n-grams by character and syllable; a model file in the other
    /// mode is rejected
    #[arg(long)]
    dual: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Count n-grams over a corpus and save the model
    Train {
        /// Training corpus (UTF-8 text)
        corpus: PathBuf,
        /// Directory receiving `{n}-gram-{mode}.model`
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// 2 or 3
        #[arg(long)]
        n_gram: Option<usize>,
        /// Drop n-grams (order >= 2) seen this many times or fewer
        #[arg(long)]
        threshold: Option<u32>,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Convert syllable sequences, one per line
    Convert {
        /// Model file written by `train`
        model_file: PathBuf,
        /// Input file; omit for an interactive prompt
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output file; defaults to stdout
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Decode an input file and score it against a reference transcription
    Eval {
        model_file: PathBuf,
        /// Syllable sequences, one per line
        input: PathBuf,
        /// Expected characters, one line per input line
        reference: PathBuf,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show header and table sizes of a model file
    Info {
        model_file: PathBuf,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the default settings TOML, or validate a settings file
    Config {
        /// Settings file to validate
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(path) = &cli.config {
        let content = die!(
            fs::read_to_string(path),
            "Error reading {}: {}",
            path.display()
        );
        die!(settings::init_custom(content), "Error in settings: {}");
    }
    let settings = settings::settings();

    match cli.command {
        Command::Train {
            corpus,
            save_dir,
            n_gram,
            threshold,
            model,
        } => {
            let mut config = model_config(settings, &model);
            if let Some(n) = n_gram {
                config.order = n;
            }
            if let Some(t) = threshold {
                config.threshold = t;
            }
            let (vocab, table) = open_reference(settings, &model, config.mode);
            let text = die!(
                fs::read_to_string(&corpus),
                "Error reading {}: {}",
                corpus.display()
            );
            let oracle = PinyinOracle;
            let trained = die!(
                Model::train(&text, vocab, table, Some(&oracle), config),
                "Training failed: {}"
            );
            let dir = save_dir.unwrap_or_else(|| settings.data.model_dir.clone());
            die!(fs::create_dir_all(&dir), "Error creating {}: {}", dir.display());
            let path = die!(trained.save(&dir), "Error saving model: {}");
            print_stats(&trained.stats());
            println!("saved {}", path.display());
        }

        Command::Convert {
            model_file,
            input,
            output,
            model,
        } => {
            let loaded = load_model(settings, &model, &model_file);
            let marker = settings.output.unrecognized_marker.as_str();
            match input {
                Some(input) => {
                    let lines = read_syllable_lines(&input);
                    let decoded = decode_lines(&loaded, &lines, marker);
                    let mut out: Box<dyn Write> = match output {
                        Some(path) => Box::new(BufWriter::new(die!(
                            fs::File::create(&path),
                            "Error creating {}: {}",
                            path.display()
                        ))),
                        None => Box::new(BufWriter::new(io::stdout().lock())),
                    };
                    for line in &decoded {
                        die!(writeln!(out, "{line}"), "Write error: {}");
                    }
                    die!(out.flush(), "Write error: {}");
                }
                None => interactive(&loaded, marker),
            }
        }

        Command::Eval {
            model_file,
            input,
            reference,
            json,
            model,
        } => {
            let loaded = load_model(settings, &model, &model_file);
            let lines = read_syllable_lines(&input);
            let decoded = decode_lines(&loaded, &lines, &settings.output.unrecognized_marker);
            let expected: Vec<String> = read_text(&reference)
                .lines()
                .map(|l| l.trim().to_string())
                .collect();
            let acc = score_lines(&decoded, &expected);
            if json {
                println!(
                    "{}",
                    die!(serde_json::to_string_pretty(&acc), "JSON error: {}")
                );
            } else {
                println!(
                    "Sentence accuracy: {:.2}% ({}/{})",
                    acc.sentence_accuracy() * 100.0,
                    acc.sentences_correct,
                    acc.sentences
                );
                println!(
                    "Char accuracy:     {:.2}% ({}/{})",
                    acc.char_accuracy() * 100.0,
                    acc.chars_correct,
                    acc.chars
                );
            }
        }

        Command::Info { model_file, json } => {
            let header = die!(read_header(&model_file), "Error reading header: {}");
            let counts = die!(
                NGramCounts::open(&model_file, header.mode),
                "Error opening model: {}"
            );
            let stats = ModelStats::of(&counts);
            if json {
                println!(
                    "{}",
                    die!(serde_json::to_string_pretty(&stats), "JSON error: {}")
                );
            } else {
                print_stats(&stats);
            }
        }

        Command::Config { file } => match file {
            None => print!("{}", settings::default_toml()),
            Some(path) => {
                let content = read_text(&path);
                let s = die!(settings::parse_settings_toml(&content), "Error: {}");
                println!(
                    "OK: model.n_gram={}, model.alpha={}, model.beta={}, decoder.pruning={}",
                    s.model.n_gram, s.model.alpha, s.model.beta, s.decoder.pruning
                );
            }
        },
    }
}

fn model_config(settings: &Settings, args: &ModelArgs) -> ModelConfig {
    let mut config = settings.model_config();
    let Interpolation { alpha, beta } = config.decoder.weights;
    config.decoder.weights = Interpolation {
        alpha: args.alpha.unwrap_or(alpha),
        beta: args.beta.unwrap_or(beta),
    };
    if args.no_pruning {
        config.decoder.beam = None;
    }
    if args.dual {
        config.mode = SymbolMode::Dual;
    }
    config
}

fn open_reference(
    settings: &Settings,
    args: &ModelArgs,
    mode: SymbolMode,
) -> (Vocabulary, SyllableTable) {
    die!(
        try_open_reference(settings, args, mode),
        "Error opening reference data: {}"
    )
}

fn try_open_reference(
    settings: &Settings,
    args: &ModelArgs,
    mode: SymbolMode,
) -> Result<(Vocabulary, SyllableTable), DictError> {
    let vocab_path = args.vocab.as_ref().unwrap_or(&settings.data.vocabulary);
    let syllables_path = args.syllables.as_ref().unwrap_or(&settings.data.syllables);
    let vocab = Vocabulary::open(vocab_path)?;
    let table = SyllableTable::open(syllables_path, &vocab, mode)?;
    Ok((vocab, table))
}

fn load_model(settings: &Settings, args: &ModelArgs, path: &Path) -> Model {
    die!(try_load_model(settings, args, path), "Error loading model: {}")
}

/// Load a model in the configured symbol mode; a file written in the
/// other mode is an error.
fn try_load_model(settings: &Settings, args: &ModelArgs, path: &Path) -> Result<Model, ModelError> {
    let config = model_config(settings, args);
    let (vocab, table) = try_open_reference(settings, args, config.mode)?;
    Model::load(path, vocab, table, config)
}

fn read_text(path: &Path) -> String {
    let text = die!(
        fs::read_to_string(path),
        "Error reading {}: {}",
        path.display()
    );
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn read_syllable_lines(path: &Path) -> Vec<Vec<String>> {
    read_text(path)
        .lines()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn decode_lines(model: &Model, lines: &[Vec<String>], marker: &str) -> Vec<String> {
    model
        .decode_batch(lines)
        .into_iter()
        .enumerate()
        .map(|(i, result)| match result {
            Ok(conversion) => conversion.text(),
            Err(e) => {
                warn!(line = i + 1, error = %e, "line not decoded");
                marker.to_string()
            }
        })
        .collect()
}

fn interactive(model: &Model, marker: &str) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("Input pinyin sequence: ");
        die!(stdout.flush(), "Write error: {}");
        let mut line = String::new();
        if die!(stdin.lock().read_line(&mut line), "Read error: {}") == 0 {
            break;
        }
        let syllables: Vec<&str> = line.split_whitespace().collect();
        match model.decode(&syllables) {
            Ok(chars) => println!("{}", chars.into_iter().collect::<String>()),
            Err(e) => {
                eprintln!("{e}");
                println!("{marker}");
            }
        }
    }
}

fn print_stats(stats: &ModelStats) {
    println!("Order:      {}", stats.order);
    println!("Mode:       {}", stats.mode.name());
    println!("numSingle:  {}", stats.num_single);
    for (n, size) in stats.entries.iter().enumerate() {
        println!("{}-grams:    {}", n + 1, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinyin_lm::ngram::CodecError;

    fn args(dir: &Path, dual: bool) -> ModelArgs {
        ModelArgs {
            vocab: Some(dir.join("vocabulary.txt")),
            syllables: Some(dir.join("syllables.txt")),
            alpha: None,
            beta: None,
            no_pruning: false,
            dual,
        }
    }

    fn saved_single_model(dir: &Path, settings: &Settings) -> PathBuf {
        fs::write(dir.join("vocabulary.txt"), "清氰华化").unwrap();
        fs::write(dir.join("syllables.txt"), "qing 清 氰\nhua 华 化\n").unwrap();
        let single = args(dir, false);
        let config = model_config(settings, &single);
        let (vocab, table) = try_open_reference(settings, &single, config.mode).unwrap();
        let model = Model::train("清华。清华", vocab, table, None, config).unwrap();
        model.save(dir).unwrap()
    }

    #[test]
    fn load_in_configured_mode() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings::parse_settings_toml(settings::default_toml()).unwrap();
        let path = saved_single_model(dir.path(), &settings);
        let model = try_load_model(&settings, &args(dir.path(), false), &path).unwrap();
        assert_eq!(model.decode(&["qing", "hua"]).unwrap(), vec!['清', '华']);
    }

    #[test]
    fn dual_flag_rejects_single_model() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings::parse_settings_toml(settings::default_toml()).unwrap();
        let path = saved_single_model(dir.path(), &settings);
        let err = try_load_model(&settings, &args(dir.path(), true), &path).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Codec(CodecError::ModelModeMismatch {
                file_dual: false,
                expected_dual: true
            })
        ));
    }

    #[test]
    fn dual_settings_reject_single_model() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = settings::parse_settings_toml(settings::default_toml()).unwrap();
        let path = saved_single_model(dir.path(), &defaults);
        let dual = settings::parse_settings_toml(
            &settings::default_toml().replace("dual_syllable = false", "dual_syllable = true"),
        )
        .unwrap();
        let err = try_load_model(&dual, &args(dir.path(), false), &path).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Codec(CodecError::ModelModeMismatch { .. })
        ));
    }
}
