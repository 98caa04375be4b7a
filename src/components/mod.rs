//! Structures which can be stored as binary snapshots.

use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use fs_err::File;
use serde::{de::DeserializeOwned, Serialize};

pub trait Component: Serialize + DeserializeOwned {
    fn name() -> &'static str;

    fn new<P: AsRef<Path>>(p: P) -> Result<Self, crate::Error> {
        let reader = BufReader::new(File::open(p.as_ref())?);
        Self::from_reader(reader)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, crate::Error> {
        Ok(bincode::deserialize_from(reader)?)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), crate::Error> {
        Ok(bincode::serialize_into(writer, self)?)
    }

    fn to_path<P: AsRef<Path>>(&self, p: P) -> Result<(), crate::Error> {
        let mut writer = BufWriter::new(File::create(p.as_ref())?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
