//! Filter sets: the unit a search runs.

use crate::definition::FilterSetDef;
use crate::error::FilterError;
use crate::filter::Filter;
use crate::mode::FilterMode;

/// Filters evaluated together against one resource type.
#[derive(Debug, Clone)]
pub struct FilterSet {
    resource_type: String,
    mode: FilterMode,
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Creates a set from already compiled filters.
    ///
    /// Fails with [`FilterError::EmptyFilterSet`] if `filters` is empty.
    pub fn new(
        resource_type: impl Into<String>,
        mode: FilterMode,
        filters: Vec<Filter>,
    ) -> Result<Self, FilterError> {
        if filters.is_empty() {
            return Err(FilterError::EmptyFilterSet);
        }
        Ok(FilterSet {
            resource_type: resource_type.into().trim().to_ascii_uppercase(),
            mode,
            filters,
        })
    }

    /// Validates a persisted definition, reporting the index of the first
    /// filter that fails.
    pub fn compile(def: &FilterSetDef) -> Result<Self, FilterError> {
        let filters = def
            .filters
            .iter()
            .enumerate()
            .map(|(index, filter)| {
                Filter::compile(filter).map_err(|source| FilterError::InFilter {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        FilterSet::new(def.resource_type.as_str(), def.mode, filters)
    }

    /// Upper-cased type tag of the resources to search, e.g. `CRE`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_rejected() {
        assert!(matches!(
            FilterSet::new("CRE", FilterMode::MatchAll, Vec::new()),
            Err(FilterError::EmptyFilterSet)
        ));

        let def: FilterSetDef =
            serde_json::from_str(r#"{ "resource_type": "CRE", "filters": [] }"#).unwrap();
        assert!(matches!(FilterSet::compile(&def), Err(FilterError::EmptyFilterSet)));
    }

    #[test]
    fn failing_filter_reports_its_index() {
        let json = r#"{
            "resource_type": "itm",
            "mode": "or",
            "filters": [
                { "selector": { "by": "name", "name": "Type" },
                  "value": { "type": "number", "min": 1, "max": 2 } },
                { "selector": { "by": "name", "name": "Name" },
                  "value": { "type": "text", "text": "(", "regex": true } }
            ]
        }"#;
        let def: FilterSetDef = serde_json::from_str(json).unwrap();
        let err = FilterSet::compile(&def).unwrap_err();
        match &err {
            FilterError::InFilter { index, source } => {
                assert_eq!(*index, 1);
                assert!(matches!(**source, FilterError::InvalidRegex(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().starts_with("filter #1:"));
    }

    #[test]
    fn resource_type_is_normalized() {
        let filter = Filter::by_name("Type").number(1, 1).build().unwrap();
        let set = FilterSet::new(" itm ", FilterMode::MatchAny, vec![filter]).unwrap();
        assert_eq!(set.resource_type(), "ITM");
        assert_eq!(set.mode(), FilterMode::MatchAny);
        assert_eq!(set.len(), 1);
    }
}
