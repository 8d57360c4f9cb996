use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("CsvError({:?})", .0)]
    Csv(#[from] csv::Error),
    #[error("IoError({:?})", .0)]
    Io(#[from] std::io::Error),
    #[error("UnknownColumn (name={})", .0)]
    UnknownColumn(String),
}
