use std::io::{self, BufRead};

use crate::encoding::{Dataset, Record};
use crate::error::{Error, MalformedKind, Result};

/// Field separator of the source format
const DELIMITER: char = ',';

/// Parser for the promotion source format
pub struct Parser;

impl Parser {
    /// Parse a whole source stream into a dataset.
    ///
    /// Fails on the first bad line; nothing parsed so far is returned in that
    /// case. When an id repeats, only its first line is kept, although every
    /// line is still validated.
    pub fn parse<R: BufRead>(reader: R) -> Result<Dataset> {
        let mut dataset = Dataset::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => malformed(line_no, MalformedKind::InvalidEncoding),
                _ => Error::Read(e),
            })?;

            if line.is_empty() {
                continue;
            }

            dataset.insert_first(Self::parse_line(&line, line_no)?);
        }

        Ok(dataset)
    }

    /// Parse one `id,price,expirationDate` line
    fn parse_line(line: &str, line_no: usize) -> Result<Record> {
        let mut fields = line.split(DELIMITER);

        // fields past the third are ignored
        let (Some(id), Some(price), Some(expiration)) = (fields.next(), fields.next(), fields.next())
        else {
            let found = line.split(DELIMITER).count();
            return Err(malformed(line_no, MalformedKind::MissingFields { found }));
        };

        let price = price.parse::<f64>().map_err(|source| {
            malformed(
                line_no,
                MalformedKind::InvalidPrice {
                    value: price.to_string(),
                    source,
                },
            )
        })?;

        Ok(Record::new(id, price, expiration))
    }
}

fn malformed(line: usize, kind: MalformedKind) -> Error {
    Error::MalformedRecord { line, kind }
}
