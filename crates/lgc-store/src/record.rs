/// One record: an ordered sequence of `(tag, value)` pairs.
///
/// Tags are short field names (`id`, `ty`, `ch`, `w`, `t`, `g`, ...). For
/// keyed-table records each tag appears at most once and [`Record::set`]
/// replaces in place; for property-list records (sentences) duplicate tags
/// and their order are significant and [`Record::push`] appends.
///
/// On disk a record is a block of `tag value` lines; blocks are separated
/// by blank lines (see [`crate::formats`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields (counting duplicates).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of the first field with `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the first field with `tag`, or append one.
    pub fn set(&mut self, tag: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| t == tag) {
            Some((_, v)) => *v = value,
            None => self.fields.push((tag.to_string(), value)),
        }
    }

    /// Append a field, keeping any existing fields with the same tag.
    pub fn push(&mut self, tag: &str, value: impl Into<String>) {
        self.fields.push((tag.to_string(), value.into()));
    }

    /// Remove the first field with `tag`, returning its value.
    pub fn remove(&mut self, tag: &str) -> Option<String> {
        let pos = self.fields.iter().position(|(t, _)| t == tag)?;
        Some(self.fields.remove(pos).1)
    }

    /// Iterate over `(tag, value)` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Parse a block of `tag value` lines.
    ///
    /// The tag runs to the first space; the rest of the line, verbatim, is
    /// the value. A line without a space is a tag with an empty value.
    pub(crate) fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        let mut record = Self::new();
        for line in lines {
            let line = line.strip_suffix('\r').unwrap_or(line);
            match line.split_once(' ') {
                Some((tag, value)) => record.push(tag, value),
                None => record.push(line, ""),
            }
        }
        record
    }

    /// Render as `tag value` lines (no trailing blank line).
    pub(crate) fn write_lines(&self, out: &mut String) {
        for (tag, value) in self.pairs() {
            out.push_str(tag);
            if !value.is_empty() {
                out.push(' ');
                out.push_str(value);
            }
            out.push('\n');
        }
    }
}
