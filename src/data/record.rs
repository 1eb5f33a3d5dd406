//! Ordered records of named string fields.

/// An ordered list of named string fields.
///
/// Inserting a key that is already present replaces the value but keeps the
/// position of the first insertion.  This is what makes the merge order of
/// coordinate, metadata, and score fields work out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// The fields in insertion order.
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create a new, empty `Record`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Field name.
    /// * `value` - Field value.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Merge all fields of `other` into `self`, values of `other` win.
    pub fn update(&mut self, other: &Record) {
        for (key, value) in &other.fields {
            self.insert(key.as_str(), value.as_str());
        }
    }

    /// Value of the given field, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Mutable access to the field values in order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.fields.iter_mut().map(|(_, v)| v)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut result = Self::new();
        for (key, value) in iter {
            result.insert(key, value);
        }
        result
    }
}
