use indexmap::{IndexMap, IndexSet};

/// Column name of the title-derived property type
pub const PROPERTY_TYPE_KEY: &str = "property_type";
/// Column name of the title-derived locality
pub const LOCALITY_KEY: &str = "locality";

/// One property's extracted data
///
/// `characteristics` holds whatever label/value pairs the page exposed, in
/// page order. The two title-derived fields are kept apart and only merged
/// in by [`fields`](Self::fields).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicRecord {
    pub characteristics: IndexMap<String, String>,
    pub property_type: Option<String>,
    pub locality: Option<String>,
}

impl CharacteristicRecord {
    /// Flat key/value view: characteristics in page order, then
    /// `property_type` and `locality` (empty when the title had none)
    ///
    /// The title-derived values replace a characteristic that happens to
    /// use the same label.
    #[must_use]
    pub fn fields(&self) -> IndexMap<String, String> {
        let mut fields = self.characteristics.clone();
        fields.insert(
            PROPERTY_TYPE_KEY.to_string(),
            self.property_type.clone().unwrap_or_default(),
        );
        fields.insert(
            LOCALITY_KEY.to_string(),
            self.locality.clone().unwrap_or_default(),
        );
        fields
    }
}

/// Ordered records of one extraction run
///
/// Rows have heterogeneous key sets; the output schema is the union of all
/// keys in first-seen order, computed once by [`columns`](Self::columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: Vec<CharacteristicRecord>,
}

impl RecordTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CharacteristicRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[CharacteristicRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of every record's keys, in first-seen order
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        let mut columns = IndexSet::new();
        for record in &self.records {
            for key in record.fields().into_keys() {
                columns.insert(key);
            }
        }
        columns.into_iter().collect()
    }

    /// Rows aligned to `columns`; `None` where a record lacks the key
    pub fn rows<'a>(
        &'a self,
        columns: &'a [String],
    ) -> impl Iterator<Item = Vec<Option<String>>> + 'a {
        self.records.iter().map(move |record| {
            let mut fields = record.fields();
            columns
                .iter()
                .map(|column| fields.swap_remove(column))
                .collect()
        })
    }
}

impl FromIterator<CharacteristicRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = CharacteristicRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)], property_type: &str) -> CharacteristicRecord {
        CharacteristicRecord {
            characteristics: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            property_type: Some(property_type.to_string()),
            locality: None,
        }
    }

    #[test]
    fn columns_are_first_seen_union() {
        let table: RecordTable = vec![
            record(&[("Bedrooms", "3"), ("Garage", "1")], "House"),
            record(&[("Surface", "80 m²"), ("Bedrooms", "2")], "Apartment"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            table.columns(),
            vec!["Bedrooms", "Garage", "property_type", "locality", "Surface"]
        );
    }

    #[test]
    fn rows_leave_gaps_for_missing_keys() {
        let table: RecordTable = vec![
            record(&[("Bedrooms", "3")], "House"),
            record(&[("Surface", "80 m²")], "Apartment"),
        ]
        .into_iter()
        .collect();
        let columns = table.columns();
        let rows: Vec<_> = table.rows(&columns).collect();

        assert_eq!(
            rows[1],
            vec![
                None,
                Some("Apartment".to_string()),
                Some(String::new()),
                Some("80 m²".to_string())
            ]
        );
    }
}
