use std::fmt;
use std::io::{self, Cursor, Read};

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::Result;

pub mod connection;
pub mod stub;

pub use connection::Connection;
pub use stub::StubTransport;

/// Source of raw response bodies for endpoint descriptors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, endpoint: &Endpoint) -> Result<ResponseBody>;
}

/// Raw payload handed from a transport to the parser. Dropping it releases the body.
pub struct ResponseBody {
    reader: Box<dyn Read + Send>,
}

impl ResponseBody {
    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::from_reader(Cursor::new(bytes.into()))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    pub fn into_string(mut self) -> Result<String> {
        let mut text = String::new();
        self.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}
