// src/filter/builtin.rs

use regex::Regex;

use crate::errors::Result;
use crate::file::FileHandle;
use crate::filter::Filter;
use crate::types::Encoding;

/// Writes every input, in order, to the output. Never looks at the bytes,
/// so it runs in binary mode. With the identity namer it is a plain copy.
#[derive(Debug, Clone, Default)]
pub struct ConcatFilter;

impl ConcatFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter for ConcatFilter {
    fn name(&self) -> &str {
        "concat"
    }

    fn encoding(&self) -> Encoding {
        Encoding::Binary
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in inputs {
            output.write(input.read()?)?;
        }
        Ok(())
    }
}

/// [`ConcatFilter`] that first moves the named inputs to the front, in the
/// given order. Inputs not named keep their relative order after them.
#[derive(Debug, Clone, Default)]
pub struct OrderingConcatFilter {
    ordering: Vec<String>,
}

impl OrderingConcatFilter {
    pub fn new<I, S>(ordering: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ordering: ordering.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ordering(&self) -> &[String] {
        &self.ordering
    }

    /// `inputs` reordered so that named files come first.
    pub fn order<'a>(&self, inputs: &'a [FileHandle]) -> Vec<&'a FileHandle> {
        let mut ordered: Vec<&FileHandle> = inputs.iter().collect();
        for name in self.ordering.iter().rev() {
            if let Some(pos) = ordered.iter().position(|f| f.path() == name) {
                let file = ordered.remove(pos);
                ordered.insert(0, file);
            }
        }
        ordered
    }
}

impl Filter for OrderingConcatFilter {
    fn name(&self) -> &str {
        "ordering_concat"
    }

    fn encoding(&self) -> Encoding {
        Encoding::Binary
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in self.order(inputs) {
            output.write(input.read()?)?;
        }
        Ok(())
    }
}

/// Regex search-and-replace over UTF-8 text. The replacement supports
/// `$1` / `${name}` capture references.
#[derive(Debug, Clone)]
pub struct GsubFilter {
    pattern: Regex,
    replacement: String,
}

impl GsubFilter {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Filter for GsubFilter {
    fn name(&self) -> &str {
        "gsub"
    }

    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()> {
        for input in inputs {
            let text = input.read_to_string()?;
            let replaced = self.pattern.replace_all(&text, self.replacement.as_str());
            output.write(replaced.as_bytes())?;
        }
        Ok(())
    }
}

