use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

static QUOTES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/quotes");

/// Shown in place of a quote when none could be acquired
pub const PLACEHOLDER_TEXT: &str =
    "There was an error fetching the quote. Please restart the test.";

#[derive(Debug)]
pub enum FetchError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    MissingQuote,
    Empty,
    UnknownCollection(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Io(e) => write!(f, "could not read quote source: {e}"),
            FetchError::Parse(e) => write!(f, "invalid quote data received: {e}"),
            FetchError::MissingQuote => write!(f, "quote data has no quote"),
            FetchError::Empty => write!(f, "quote is empty"),
            FetchError::UnknownCollection(name) => write!(f, "unknown quote collection '{name}'"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io(e) => Some(e),
            FetchError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e)
    }
}

/// Supplies target texts for typing sessions
pub trait TextProvider {
    fn next_text(&mut self) -> Result<String, FetchError>;
}

/// One quote as served by the quote API: `{"quote": "...", "author": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl QuoteResponse {
    pub fn into_text(self) -> Result<String, FetchError> {
        let quote = self.quote.ok_or(FetchError::MissingQuote)?;
        let text = normalize(&quote);
        if text.is_empty() {
            return Err(FetchError::MissingQuote);
        }
        Ok(text)
    }
}

pub fn parse_quote_response(body: &str) -> Result<String, FetchError> {
    serde_json::from_str::<QuoteResponse>(body)?.into_text()
}

/// Collapse whitespace runs (newlines, tabs) into single spaces
pub fn normalize(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn pick_index(rng: &mut StdRng, len: usize, last: Option<usize>) -> usize {
    match last {
        Some(last) if len > 1 => {
            let idx = rng.gen_range(0..len - 1);
            if idx >= last {
                idx + 1
            } else {
                idx
            }
        }
        _ => rng.gen_range(0..len),
    }
}

/// Always hands out the same text, used for `--prompt`
#[derive(Debug, Clone)]
pub struct StaticProvider {
    text: String,
}

impl StaticProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextProvider for StaticProvider {
    fn next_text(&mut self) -> Result<String, FetchError> {
        let text = normalize(&self.text);
        if text.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(text)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    Classics,
    Programming,
}

#[derive(Deserialize, Clone, Debug)]
struct QuoteCollection {
    name: String,
    quotes: Vec<QuoteResponse>,
}

/// Quotes embedded in the binary, picked at random without immediate repeats
#[derive(Debug)]
pub struct QuoteBook {
    name: String,
    quotes: Vec<QuoteResponse>,
    last: Option<usize>,
    rng: StdRng,
}

impl QuoteBook {
    pub fn new(collection: Collection) -> Result<Self, FetchError> {
        Self::with_rng(collection, StdRng::from_entropy())
    }

    pub fn with_seed(collection: Collection, seed: u64) -> Result<Self, FetchError> {
        Self::with_rng(collection, StdRng::seed_from_u64(seed))
    }

    fn with_rng(collection: Collection, rng: StdRng) -> Result<Self, FetchError> {
        let file_name = format!("{collection}.json");
        let contents = QUOTES_DIR
            .get_file(&file_name)
            .and_then(|file| file.contents_utf8())
            .ok_or_else(|| FetchError::UnknownCollection(collection.to_string()))?;

        let parsed: QuoteCollection = serde_json::from_str(contents)?;
        if parsed.quotes.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(Self {
            name: parsed.name,
            quotes: parsed.quotes,
            last: None,
            rng,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl TextProvider for QuoteBook {
    fn next_text(&mut self) -> Result<String, FetchError> {
        let idx = pick_index(&mut self.rng, self.quotes.len(), self.last);
        self.last = Some(idx);
        self.quotes[idx].clone().into_text()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteFile {
    Many(Vec<QuoteResponse>),
    One(QuoteResponse),
}

/// Reads quotes in the API response format from a local file, re-reading on every request
#[derive(Debug)]
pub struct QuoteFileProvider {
    path: PathBuf,
    last: Option<usize>,
    rng: StdRng,
}

impl QuoteFileProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last: None,
            rng: StdRng::from_entropy(),
        }
    }
}

impl TextProvider for QuoteFileProvider {
    fn next_text(&mut self) -> Result<String, FetchError> {
        let body = fs::read_to_string(&self.path)?;

        match serde_json::from_str::<QuoteFile>(&body)? {
            QuoteFile::Many(responses) if responses.is_empty() => Err(FetchError::Empty),
            QuoteFile::Many(mut responses) => {
                let idx = pick_index(&mut self.rng, responses.len(), self.last);
                self.last = Some(idx);
                responses.swap_remove(idx).into_text()
            }
            QuoteFile::One(response) => response.into_text(),
        }
    }
}

/// Ask the provider for a text, falling back to the placeholder so a session can still start
pub fn acquire_text(provider: &mut dyn TextProvider) -> String {
    match provider.next_text() {
        Ok(text) => {
            crate::tq_debug!("provider", "acquired {} character text", text.chars().count());
            text
        }
        Err(e) => {
            crate::tq_error!("provider", "error fetching quote: {e}");
            PLACEHOLDER_TEXT.to_string()
        }
    }
}
