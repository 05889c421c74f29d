use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Query string endpoint for the host (VCH) list.
pub const HOSTS_LIST_PATH: &str =
    "/ui/vic/rest/data/list/?targetType=vic:VirtualContainerHostVm&properties=match,results";

/// Query string endpoint for the container VM list.
pub const CONTAINERS_LIST_PATH: &str =
    "/ui/vic/rest/data/list/?targetType=vic:ContainerVm&properties=match,results";

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid sorting {0:?}: expected <field>,<asc|desc>")]
    Sorting(String),

    #[error("invalid filter term {0:?}: expected <property>=<value>")]
    Filter(String),
}

/// Which remote collection a list request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListTarget {
    Hosts,
    Containers,
}

impl ListTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Containers => "containers",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Hosts => HOSTS_LIST_PATH,
            Self::Containers => CONTAINERS_LIST_PATH,
        }
    }
}

impl fmt::Display for ListTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::asc("name")
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once(',')
            .ok_or_else(|| QueryError::Sorting(s.to_string()))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(QueryError::Sorting(s.to_string()));
        }
        let direction = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(QueryError::Sorting(s.to_string())),
        };
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// One `property=value` filter term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTerm {
    pub property: String,
    pub value: String,
}

impl FilterTerm {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.property, self.value)
    }
}

impl FromStr for FilterTerm {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((p, v)) if !p.trim().is_empty() => Ok(Self::new(p.trim(), v)),
            _ => Err(QueryError::Filter(s.to_string())),
        }
    }
}

/// Parses a comma-joined filter expression. An empty expression yields no terms.
pub fn parse_filter(expr: &str) -> Result<Vec<FilterTerm>, QueryError> {
    expr.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect()
}

/// Immutable parameters for one list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub offset: u32,
    pub page_size: NonZeroU32,
    pub sort: Sort,
    pub filter: Vec<FilterTerm>,
}

impl QueryState {
    pub fn new(offset: u32, page_size: NonZeroU32, sort: Sort) -> Self {
        Self {
            offset,
            page_size,
            sort,
            filter: Vec::new(),
        }
    }

    pub fn with_filter(mut self, term: FilterTerm) -> Self {
        self.filter.push(term);
        self
    }

    /// Comma-joined `property=value` terms; empty when no filter is set.
    pub fn filter_expr(&self) -> String {
        self.filter
            .iter()
            .map(FilterTerm::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, Sort::default())
    }
}

/// Appends the list parameters to `base_url`.
///
/// Parameter order is fixed: offset, maxResultCount, sorting, filter. The
/// filter term is left out when no filter is set. Values are not escaped;
/// the service splits on `,` and `=` itself.
pub fn build_query_string(base_url: &str, state: &QueryState) -> String {
    let mut query = format!(
        "{base_url}&offset={}&maxResultCount={}&sorting={}",
        state.offset, state.page_size, state.sort
    );
    if !state.filter.is_empty() {
        query.push_str("&filter=");
        query.push_str(&state.filter_expr());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn builds_parameters_in_fixed_order() {
        let state = QueryState::new(0, page(50), Sort::asc("id"))
            .with_filter(FilterTerm::new("name", "j"));
        assert_eq!(
            build_query_string("test?some=1", &state),
            "test?some=1&offset=0&maxResultCount=50&sorting=id,asc&filter=name=j"
        );
    }

    #[test]
    fn omits_filter_when_unset_and_joins_multiple_terms() {
        let state = QueryState::new(20, page(10), Sort::desc("powerState"));
        assert_eq!(
            build_query_string(HOSTS_LIST_PATH, &state),
            format!("{HOSTS_LIST_PATH}&offset=20&maxResultCount=10&sorting=powerState,desc")
        );

        let state = state
            .with_filter(FilterTerm::new("name", "web"))
            .with_filter(FilterTerm::new("imageName", "nginx"));
        assert!(
            build_query_string("b?x=1", &state).ends_with("&filter=name=web,imageName=nginx")
        );
    }

    #[test]
    fn default_state_is_first_page_by_name() {
        let state = QueryState::default();
        assert_eq!(state.offset, 0);
        assert_eq!(state.page_size.get(), 10);
        assert_eq!(state.sort.to_string(), "name,asc");
    }

    #[test]
    fn parses_wire_forms() {
        assert_eq!("id,asc".parse::<Sort>().unwrap(), Sort::asc("id"));
        assert_eq!("name, DESC".parse::<Sort>().unwrap(), Sort::desc("name"));
        assert!("id".parse::<Sort>().is_err());
        assert!("id,upwards".parse::<Sort>().is_err());
        assert!(",asc".parse::<Sort>().is_err());

        assert_eq!(
            parse_filter("name=j,portMapping=80:80").unwrap(),
            vec![
                FilterTerm::new("name", "j"),
                FilterTerm::new("portMapping", "80:80")
            ]
        );
        assert!(parse_filter("").unwrap().is_empty());
        assert_eq!(
            parse_filter("novalue").unwrap_err(),
            QueryError::Filter("novalue".into())
        );
    }
}
