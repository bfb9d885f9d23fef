use kohonen_glyphs::cli::{Cli, Command, SimulateArgs, TrainArgs};
use kohonen_glyphs::proc::ProcessorBuilder;
use kohonen_glyphs::storage;
use log::{debug, info};
use std::error::Error;
use std::io;
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::from_args();

    let level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Train(train_args) => train(&train_args),
        Command::Simulate(sim_args) => simulate(&sim_args),
    }
}

fn train(args: &TrainArgs) -> Result<(), Box<dyn Error>> {
    let mut builder = ProcessorBuilder::new().with_delimiter(args.delimiter()?);
    if let Some(label) = &args.label {
        builder = builder.with_label(label);
    }
    let proc = builder.build_from_file(&args.file)?;

    let mut som = proc.create_som(args.params())?;
    info!(
        "Training SOM with {} inputs and {} units for up to {} epochs",
        som.inputs(),
        som.units(),
        som.params().epochs()
    );

    som.train_with(proc.data(), |report| {
        debug!(
            "Epoch {}/{}: DM {:.6}, learning rate {:.6}",
            report.epoch,
            args.epochs,
            report.dm,
            report.learning_rate
        );
        if report.epoch % 10 == 0 {
            info!(
                "Epoch {}: DM {:.6} (best {:.6})",
                report.epoch, report.dm, report.best_dm
            );
        }
    })?;

    let labels = match proc.labels() {
        Some(_) => Some(proc.label_units(&som)?),
        None => None,
    };
    storage::save(&som, labels.as_deref(), &args.output)?;

    if let Some(path) = &args.units {
        proc.write_som_units(&som, labels.as_deref(), path)?;
    }
    if let Some(path) = &args.history {
        proc.write_history(&som, path)?;
    }
    Ok(())
}

fn simulate(args: &SimulateArgs) -> Result<(), Box<dyn Error>> {
    let model = storage::load(&args.model)?;

    let mut builder = ProcessorBuilder::new().with_delimiter(args.delimiter()?);
    if let Some(label) = &args.label {
        builder = builder.with_label(label);
    }
    let proc = builder.build_from_file(&args.file)?;

    let results = proc.classify(&model.som, model.labels.as_deref())?;

    if let Some(path) = &args.output {
        proc.write_data_nearest(&results, path)?;
        info!("Wrote {} results to {}", results.len(), path.display());
    } else {
        let mut writer = csv::Writer::from_writer(io::stdout());
        writer.write_record(&["row", "som_index", "distance", "predicted"])?;
        for (index, res) in results.iter().enumerate() {
            writer.write_record(&[
                index.to_string(),
                res.unit.to_string(),
                res.distance.to_string(),
                res.predicted.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
    }

    if proc.labels().is_some() && model.labels.is_some() {
        let correct = results
            .iter()
            .filter(|r| r.predicted.is_some() && r.predicted == r.label)
            .count();
        info!(
            "Classified {} of {} samples correctly",
            correct,
            results.len()
        );
    }
    Ok(())
}
