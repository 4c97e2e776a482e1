//! Metadata filter expressions handed to the vector and attribute stores.
//!
//! Stores render them through [`FilterExpr::to_sql`]. A disjunction of equalities on one
//! field renders as a flat `IN (...)` list, which keeps the SQL shallow no matter how many
//! candidates the funnel carries.

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Eq { field: String, value: String },
    In { field: String, values: Vec<String> },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    /// `field = v1 OR field = v2 OR ...`; `None` for an empty value list.
    pub fn any_of<I, S>(field: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<FilterExpr> = values.into_iter().map(|v| Self::eq(field, v)).collect();
        match terms.len() {
            0 => None,
            1 => terms.into_iter().next(),
            _ => Some(Self::Or(terms)),
        }
    }

    pub fn and(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(b)) => { a.extend(b); Self::And(a) }
            (Self::And(mut a), e) => { a.push(e); Self::And(a) }
            (e, Self::And(mut b)) => { b.insert(0, e); Self::And(b) }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    pub fn or(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::Or(mut a), Self::Or(b)) => { a.extend(b); Self::Or(a) }
            (Self::Or(mut a), e) => { a.push(e); Self::Or(a) }
            (e, Self::Or(mut b)) => { b.insert(0, e); Self::Or(b) }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Self::Eq { field, value } => format!("{field} = {}", quote(value)),
            Self::In { values, .. } if values.is_empty() => "FALSE".to_string(),
            Self::In { field, values } => format!("{field} IN ({})", quote_list(values)),
            Self::And(terms) if terms.is_empty() => "TRUE".to_string(),
            Self::Or(terms) if terms.is_empty() => "FALSE".to_string(),
            Self::And(terms) => join(terms, " AND "),
            Self::Or(terms) => match same_field_values(terms) {
                Some((field, values)) => format!("{field} IN ({})", quote_list(&values)),
                None => join(terms, " OR "),
            },
        }
    }

    fn is_compound(&self) -> bool { matches!(self, Self::And(t) | Self::Or(t) if t.len() > 1) }
}

pub fn quote(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }

fn quote_list<S: AsRef<str>>(values: &[S]) -> String {
    values.iter().map(|v| quote(v.as_ref())).collect::<Vec<_>>().join(", ")
}

fn join(terms: &[FilterExpr], sep: &str) -> String {
    terms
        .iter()
        .map(|t| if t.is_compound() { format!("({})", t.to_sql()) } else { t.to_sql() })
        .collect::<Vec<_>>()
        .join(sep)
}

fn same_field_values(terms: &[FilterExpr]) -> Option<(&str, Vec<&str>)> {
    let mut field: Option<&str> = None;
    let mut values = Vec::with_capacity(terms.len());
    for t in terms {
        let FilterExpr::Eq { field: f, value } = t else { return None };
        match field {
            Some(existing) if existing != f => return None,
            _ => field = Some(f),
        }
        values.push(value.as_str());
    }
    field.map(|f| (f, values))
}
