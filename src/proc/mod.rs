//! Pre- and post-processing of SOM training data: reading feature tables, labelling units, reports.

use crate::data::DataFrame;
use crate::error::{Result, SomError};
use crate::map::params::SomParams;
use crate::map::som::Som;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::info;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Csv file options
#[derive(Clone, Debug)]
pub struct CsvOptions {
    delimiter: u8,
}

/// Builder for ['Processor'](struct.Processor.html).
pub struct ProcessorBuilder {
    label: Option<String>,
    csv_options: CsvOptions,
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorBuilder {
    /// Creates a `ProcessorBuilder`. All columns are features unless a label column is set.
    pub fn new() -> Self {
        ProcessorBuilder {
            label: None,
            csv_options: CsvOptions { delimiter: b',' },
        }
    }
    /// Sets the delimiter for CSV files. Default ','.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_options.delimiter = delimiter;
        self
    }
    /// Sets the column holding class labels. It is not used as a feature.
    pub fn with_label(mut self, column: &str) -> Self {
        self.label = Some(column.to_string());
        self
    }
    /// Builds a [`Processor`](struct.Processor.html) from the given data file.
    pub fn build_from_file<P: AsRef<Path>>(self, path: P) -> Result<Processor> {
        let reader = ReaderBuilder::new()
            .delimiter(self.csv_options.delimiter)
            .from_path(path.as_ref())?;
        let proc = Processor::read(reader, self.label, self.csv_options)?;
        info!(
            "Read {} samples with {} features from {}",
            proc.data.nrows(),
            proc.data.ncols(),
            path.as_ref().display()
        );
        Ok(proc)
    }
    /// Builds a [`Processor`](struct.Processor.html) from any reader.
    pub fn build_from_reader<R: Read>(self, rdr: R) -> Result<Processor> {
        let reader = ReaderBuilder::new()
            .delimiter(self.csv_options.delimiter)
            .from_reader(rdr);
        Processor::read(reader, self.label, self.csv_options)
    }
}

/// Feature table with optional class labels.
pub struct Processor {
    data: DataFrame,
    label_column: Option<String>,
    labels: Option<Vec<String>>,
    csv_options: CsvOptions,
}

impl Processor {
    /// Return a reference to the feature data.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }
    /// Return the name of the label column, if any.
    pub fn label_column(&self) -> Option<&str> {
        self.label_column.as_deref()
    }
    /// Return the class label of each sample, if a label column was given.
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    fn read<R: Read>(
        mut reader: csv::Reader<R>,
        label_column: Option<String>,
        csv_options: CsvOptions,
    ) -> Result<Processor> {
        let header: StringRecord = reader.headers()?.clone();
        let header: Vec<_> = header.iter().map(|h| h.trim()).collect();

        let label_index = match &label_column {
            Some(col) => Some(header.iter().position(|h| h == col).ok_or_else(|| {
                SomError::InvalidData(format!("Label column '{}' not found", col))
            })?),
            None => None,
        };

        let feature_indices: Vec<_> = (0..header.len())
            .filter(|i| Some(*i) != label_index)
            .collect();
        let names: Vec<_> = feature_indices.iter().map(|i| header[*i]).collect();

        let mut df = DataFrame::empty(&names);
        let mut labels = label_index.map(|_| Vec::new());
        let mut row = vec![0.0; feature_indices.len()];

        for (rec_index, record) in reader.records().enumerate() {
            let rec = record?;
            for (i, col_idx) in feature_indices.iter().enumerate() {
                let str = rec.get(*col_idx).unwrap_or("").trim();
                let value: f64 = str.parse().map_err(|_| {
                    SomError::InvalidData(format!(
                        "Unable to parse value '{}' in row {}, column '{}'",
                        str,
                        rec_index + 1,
                        header[*col_idx]
                    ))
                })?;
                if !value.is_finite() {
                    return Err(SomError::InvalidData(format!(
                        "Non-finite value '{}' in row {}, column '{}'",
                        str,
                        rec_index + 1,
                        header[*col_idx]
                    )));
                }
                row[i] = value;
            }
            if let (Some(idx), Some(labels)) = (label_index, labels.as_mut()) {
                labels.push(rec.get(idx).unwrap_or("").trim().to_string());
            }
            df.push_row(&row);
        }

        Ok(Processor {
            data: df,
            label_column,
            labels,
            csv_options,
        })
    }

    /// Creates a SOM for the `Processor`'s number of features.
    pub fn create_som(&self, params: SomParams) -> Result<Som> {
        Som::new(self.data.ncols(), params)
    }

    /// Labels each unit of the SOM by a majority vote of the samples it wins.
    ///
    /// Returns an error if the processor has no labels.
    pub fn label_units(&self, som: &Som) -> Result<Vec<Option<String>>> {
        let labels = self.labels.as_ref().ok_or_else(|| {
            SomError::InvalidData("Units can only be labelled from labelled data".to_string())
        })?;
        let winners = som.winners(&self.data)?;
        Ok(majority_labels(&winners, labels, som.units()))
    }

    /// Writes SOM units to CSV file: index, weights and label.
    pub fn write_som_units<P: AsRef<Path>>(
        &self,
        som: &Som,
        unit_labels: Option<&[Option<String>]>,
        path: P,
    ) -> Result<()> {
        check_unit_labels(som, unit_labels)?;
        let mut writer = WriterBuilder::new()
            .delimiter(self.csv_options.delimiter)
            .from_path(path)?;

        let mut names = vec!["index".to_string()];
        names.extend_from_slice(self.data.names());
        if unit_labels.is_some() {
            names.push("label".to_string());
        }
        writer.write_record(&names)?;

        for (index, weights) in som.weights().iter_rows().enumerate() {
            let mut row = vec![index.to_string()];
            row.extend(weights.iter().map(|v| v.to_string()));
            if let Some(labels) = unit_labels {
                row.push(labels[index].clone().unwrap_or_default());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Finds the winning unit for each sample and its predicted class.
    pub fn classify(
        &self,
        som: &Som,
        unit_labels: Option<&[Option<String>]>,
    ) -> Result<Vec<Classification>> {
        check_unit_labels(som, unit_labels)?;
        let winners = som.winners(&self.data)?;
        Ok(winners
            .into_iter()
            .enumerate()
            .map(|(index, (unit, distance))| Classification {
                unit,
                distance,
                label: self.labels.as_ref().map(|l| l[index].clone()),
                predicted: unit_labels.and_then(|l| l[unit].clone()),
            })
            .collect())
    }

    /// Writes the winning unit and predicted class of each sample to a CSV file.
    pub fn write_data_nearest<P: AsRef<Path>>(
        &self,
        results: &[Classification],
        path: P,
    ) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.csv_options.delimiter)
            .from_path(path)?;

        let label_name = self.label_column.clone().unwrap_or_else(|| "label".to_string());
        writer.write_record(&[
            "row",
            label_name.as_str(),
            "som_index",
            "distance",
            "predicted",
        ])?;
        for (index, res) in results.iter().enumerate() {
            writer.write_record(&[
                index.to_string(),
                res.label.clone().unwrap_or_default(),
                res.unit.to_string(),
                res.distance.to_string(),
                res.predicted.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the mean quantization error per epoch to a CSV file.
    pub fn write_history<P: AsRef<Path>>(&self, som: &Som, path: P) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.csv_options.delimiter)
            .from_path(path)?;
        writer.write_record(&["epoch", "dm"])?;
        for (epoch, dm) in som.state().history().iter().enumerate() {
            writer.write_record(&[(epoch + 1).to_string(), dm.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn check_unit_labels(som: &Som, unit_labels: Option<&[Option<String>]>) -> Result<()> {
    match unit_labels {
        Some(labels) if labels.len() != som.units() => Err(SomError::InvalidData(format!(
            "Expected {} unit labels, got {}",
            som.units(),
            labels.len()
        ))),
        _ => Ok(()),
    }
}

/// Winning unit and class of a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub unit: usize,
    pub distance: f64,
    /// Known class of the sample.
    pub label: Option<String>,
    /// Label of the winning unit.
    pub predicted: Option<String>,
}

/// Most frequent label among the samples won by each unit.
/// Ties go to the lexicographically smallest label; units without samples get `None`.
pub fn majority_labels(
    winners: &[(usize, f64)],
    labels: &[String],
    units: usize,
) -> Vec<Option<String>> {
    debug_assert_eq!(winners.len(), labels.len());
    let mut counts: Vec<BTreeMap<&str, usize>> = vec![BTreeMap::new(); units];
    for ((unit, _), label) in winners.iter().zip(labels) {
        *counts[*unit].entry(label.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|cnt| {
            let mut best: Option<(&str, usize)> = None;
            for (label, n) in cnt {
                match best {
                    Some((_, max)) if n <= max => {}
                    _ => best = Some((label, n)),
                }
            }
            best.map(|(label, _)| label.to_string())
        })
        .collect()
}
