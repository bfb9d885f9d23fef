//! Command-line interface for SOMs.
use crate::calc::decay::{DecayFunction, DecayParam};
use crate::calc::neighborhood::Neighborhood;
use crate::error::{Result, SomError};
use crate::map::params::{Competition, SomParams, StopCriteria, DEFAULT_MULTIPLIER};
use std::path::PathBuf;
use structopt::StructOpt;

/// Raw command line arguments.
#[derive(StructOpt, Debug)]
#[structopt(name = "Kohonen glyph classifier")]
pub struct Cli {
    /// Only log warnings and errors.
    #[structopt(short, long, global = true)]
    pub quiet: bool,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Train a SOM on a feature table and store it.
    Train(TrainArgs),
    /// Find the winning units for a feature table with a stored SOM.
    Simulate(SimulateArgs),
}

#[derive(StructOpt, Debug)]
pub struct TrainArgs {
    /// Path to the training data file.
    #[structopt(short, long, parse(from_os_str))]
    pub file: PathBuf,
    /// Column delimiter of the data file. Optional, default: ','.
    #[structopt(long, default_value = ",")]
    pub delimiter: char,
    /// Column with class labels, excluded from features. Optional, default: none.
    #[structopt(short, long)]
    pub label: Option<String>,
    /// Competition mode (hard|soft).
    #[structopt(short, long, default_value = "hard")]
    pub competition: Competition,
    /// Initial learning rate, in (0, 1].
    #[structopt(short, long, default_value = "0.1")]
    pub alpha: f64,
    /// Learning rate decay (inverse[:c]|exp[:c]|reciprocal|sqrt).
    #[structopt(short, long, default_value = "inverse")]
    pub decay: DecayFunction,
    /// Maximum number of training epochs.
    #[structopt(short, long, default_value = "100")]
    pub epochs: u32,
    /// Number of units per input. Optional, default: 2.
    #[structopt(short, long)]
    pub multiplier: Option<usize>,
    /// Neighborhood of soft competition (gauss|weight).
    #[structopt(short = "g", long, default_value = "gauss")]
    pub neighborhood: Neighborhood,
    /// Start neighborhood radius. Optional, default: half the units (gauss) or 0.2 (weight).
    #[structopt(short, long)]
    pub radius: Option<f64>,
    /// Neighborhood radius decay (inverse[:c]|exp[:c]|reciprocal|sqrt). Optional, default: 'exp' (gauss) or 'sqrt' (weight).
    #[structopt(long = "radius-decay")]
    pub radius_decay: Option<DecayFunction>,
    /// Half-width of the range for random initial weights.
    #[structopt(long = "init-range", default_value = "1.0")]
    pub init_range: f64,
    /// Random seed for initialization and shuffling. Optional, default: random.
    #[structopt(short, long)]
    pub seed: Option<u64>,
    /// Present samples in file order.
    #[structopt(long = "no-shuffle")]
    pub no_shuffle: bool,
    /// Stop when the mean quantization error falls below this value.
    #[structopt(long = "stop-dm", default_value = "0.1")]
    pub stop_dm: f64,
    /// Number of recent epochs checked for stability.
    #[structopt(long = "stop-window", default_value = "10")]
    pub stop_window: usize,
    /// Maximum standard deviation of recent errors to count as stable.
    #[structopt(long = "stop-std", default_value = "0.001")]
    pub stop_std: f64,
    /// Maximum error of a stable run.
    #[structopt(long = "stop-stable-dm", default_value = "0.3")]
    pub stop_stable_dm: f64,
    /// Output base path of the trained SOM (<output>.weights, <output>.json).
    #[structopt(short, long, parse(from_os_str))]
    pub output: PathBuf,
    /// CSV file for unit weights and labels. Optional, default: none.
    #[structopt(long, parse(from_os_str))]
    pub units: Option<PathBuf>,
    /// CSV file for the error history. Optional, default: none.
    #[structopt(long, parse(from_os_str))]
    pub history: Option<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct SimulateArgs {
    /// Base path of a stored SOM.
    #[structopt(short, long, parse(from_os_str))]
    pub model: PathBuf,
    /// Path to the data file.
    #[structopt(short, long, parse(from_os_str))]
    pub file: PathBuf,
    /// Column delimiter of the data file. Optional, default: ','.
    #[structopt(long, default_value = ",")]
    pub delimiter: char,
    /// Column with class labels, excluded from features. Optional, default: none.
    #[structopt(short, long)]
    pub label: Option<String>,
    /// CSV output file. Optional, default: print to stdout.
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,
}

impl TrainArgs {
    /// Builds SOM parameters from the arguments.
    pub fn params(&self) -> SomParams {
        let alpha = DecayParam::new(self.alpha, self.decay);
        let mut params = match self.competition {
            Competition::Hard => SomParams::hard(self.epochs, alpha),
            Competition::Soft => {
                SomParams::soft_default(self.epochs, alpha, self.neighborhood)
            }
        }
        .with_multiplier(self.multiplier.unwrap_or(DEFAULT_MULTIPLIER))
        .with_init_range(self.init_range)
        .with_shuffle(!self.no_shuffle)
        .with_stop(StopCriteria {
            dm_threshold: self.stop_dm,
            window: self.stop_window,
            stability_threshold: self.stop_std,
            stable_dm_threshold: self.stop_stable_dm,
        });
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if let Some(radius) = self.radius {
            params = params.with_radius_start(radius);
        }
        if let Some(decay) = self.radius_decay {
            params = params.with_radius_decay(decay);
        }
        params
    }

    /// Delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        delimiter_byte(self.delimiter)
    }
}

impl SimulateArgs {
    /// Delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        delimiter_byte(self.delimiter)
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(SomError::Configuration(format!(
            "Delimiter must be an ASCII character, got '{}'",
            delimiter
        )))
    }
}

#[cfg(test)]
mod test {
    use crate::calc::decay::{DecayFunction, DecayParam};
    use crate::calc::neighborhood::Neighborhood;
    use crate::cli::{Cli, Command, TrainArgs};
    use crate::map::params::Competition;
    use crate::map::som::Som;
    use crate::SomError;
    use structopt::StructOpt;

    fn train_args(extra: &[&str]) -> TrainArgs {
        let mut args = vec!["kohonen-glyphs", "train", "--file", "data.csv", "--output", "net"];
        args.extend_from_slice(extra);
        match Cli::from_iter_safe(&args).unwrap().command {
            Command::Train(args) => args,
            other => panic!("Expected train command, got {:?}", other),
        }
    }

    #[test]
    fn parse_train() {
        let cli = Cli::from_iter_safe(&[
            "kohonen-glyphs",
            "train",
            "--file",
            "data.csv",
            "--delimiter",
            ";",
            "--label",
            "Etiqueta",
            "--competition",
            "blanda",
            "--alpha",
            "0.3",
            "--decay",
            "exp:0.1",
            "--epochs",
            "50",
            "--neighborhood",
            "weight",
            "--seed",
            "9",
            "--output",
            "net",
        ])
        .unwrap();
        assert!(!cli.quiet);
        let args = match cli.command {
            Command::Train(args) => args,
            other => panic!("Expected train command, got {:?}", other),
        };
        assert_eq!(args.delimiter().unwrap(), b';');
        assert_eq!(args.label.as_deref(), Some("Etiqueta"));

        let params = args.params();
        assert_eq!(params.competition(), Competition::Soft);
        assert_eq!(params.neighborhood(), Neighborhood::WeightSpace);
        assert_eq!(params.alpha().start(), 0.3);
        assert_eq!(params.alpha().function(), DecayFunction::Exponential(0.1));
        assert_eq!(params.epochs(), 50);
        assert_eq!(params.seed(), Some(9));
        assert_eq!(params.radius_start(), None);
        assert_eq!(params.radius(6), DecayParam::inverse_sqrt(0.2));
        assert_eq!(params.multiplier(), 2);
        assert!(params.shuffle());
    }

    #[test]
    fn train_defaults() {
        let params = train_args(&[]).params();
        assert_eq!(params.epochs(), 100);
        assert_eq!(params.alpha().start(), 0.1);
        assert_eq!(params.competition(), Competition::Hard);
    }

    #[test]
    fn explicit_radius() {
        let params = train_args(&["-c", "soft", "--radius", "2.5", "--radius-decay", "reciprocal"])
            .params();
        assert_eq!(params.neighborhood(), Neighborhood::Gauss);
        assert_eq!(params.radius(8), DecayParam::reciprocal(2.5));

        let params = train_args(&["-c", "soft", "--radius", "0"]).params();
        assert_eq!(params.radius_start(), Some(0.0));
        assert!(matches!(
            Som::new(4, params),
            Err(SomError::Configuration(_))
        ));
    }

    #[test]
    fn parse_simulate() {
        let cli = Cli::from_iter_safe(&[
            "kohonen-glyphs",
            "-q",
            "simulate",
            "--model",
            "net",
            "--file",
            "test.csv",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Command::Simulate(args) => {
                assert!(args.output.is_none());
                assert_eq!(args.delimiter().unwrap(), b',');
            }
            other => panic!("Expected simulate command, got {:?}", other),
        }
    }

    #[test]
    fn reject_bad_enums() {
        let result = Cli::from_iter_safe(&[
            "kohonen-glyphs",
            "train",
            "--file",
            "data.csv",
            "--competition",
            "medium",
            "--epochs",
            "5",
            "--output",
            "net",
        ]);
        assert!(result.is_err());
    }
}
