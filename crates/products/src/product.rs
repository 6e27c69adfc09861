use core::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use catalog_core::{DomainError, DomainResult, Entity, ProductId};

use crate::category::Category;

const BAD_BODY: &str = "Invalid product: body of request contained bad or no data";

/// Column widths of the persistent schema, in characters.
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// Product entity.
///
/// `id` is `None` until a store persists the product; every other field is
/// replaceable in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: Option<ProductId>,
    name: String,
    description: String,
    price: Decimal,
    available: bool,
    category: Category,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            price: Decimal::ZERO,
            available: true,
            category: Category::Unknown,
        }
    }
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        available: bool,
        category: Category,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price,
            available,
            category,
        }
    }

    /// Build a fresh (unpersisted) product from an untyped record.
    pub fn from_record(record: &Value) -> DomainResult<Self> {
        let mut product = Self::default();
        product.deserialize(record)?;
        Ok(product)
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Record the identity handed out by a store.
    pub fn assign_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Flat JSON record: `price` as exact decimal text, `category` as member name.
    pub fn serialize(&self) -> Value {
        serde_json::json!({
            "id": self.id.map(ProductId::get),
            "name": self.name,
            "description": self.description,
            "price": self.price.to_string(),
            "available": self.available,
            "category": self.category.as_str(),
        })
    }

    /// Populate every field except `id` from an untyped record.
    ///
    /// Fields are checked in declaration order and the first failure is
    /// returned; on failure `self` is left untouched.
    pub fn deserialize(&mut self, record: &Value) -> DomainResult<()> {
        let fields = record
            .as_object()
            .ok_or_else(|| DomainError::validation(BAD_BODY))?;

        let name = text_field(fields, "name")?;
        if name.is_empty() {
            return Err(DomainError::validation("Invalid product: name must not be empty"));
        }
        check_length("name", name, NAME_MAX_CHARS)?;
        let description = text_field(fields, "description")?;
        check_length("description", description, DESCRIPTION_MAX_CHARS)?;
        let price = price_field(required(fields, "price")?)?;

        let available = match required(fields, "available")? {
            Value::Bool(b) => *b,
            other => {
                return Err(DomainError::validation(format!(
                    "Invalid type for boolean [available]: {}",
                    json_type(other)
                )));
            }
        };

        let category = match required(fields, "category")? {
            Value::String(s) => Category::from_str(s)?,
            other => return Err(DomainError::validation(format!("Invalid attribute: {other}"))),
        };

        self.name = name.to_string();
        self.description = description.to_string();
        self.price = price;
        self.available = available;
        self.category = category;
        Ok(())
    }
}

impl Entity for Product {
    type Id = Option<ProductId>;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Product {} id=[{}]>", self.name, id),
            None => write!(f, "<Product {} id=[None]>", self.name),
        }
    }
}

/// Parse decimal text exactly; plain and scientific notation are accepted.
///
/// Text the decimal type can only hold after rounding (more than 28
/// significant digits) is rejected.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let parsed = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()?;
    (significand(text)? == significand(&parsed.to_string())?).then_some(parsed)
}

/// Sign, significant digits and power of ten of decimal text, with leading
/// and trailing zeros stripped. Zero has no digits and no sign.
fn significand(text: &str) -> Option<(bool, String, i64)> {
    let text = text.replace('_', "");
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (int.is_empty() && frac.is_empty()) || !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{int}{frac}");
    let without_trailing = digits.trim_end_matches('0');
    let exponent = exponent - frac.len() as i64 + (digits.len() - without_trailing.len()) as i64;
    let significant = without_trailing.trim_start_matches('0');
    if significant.is_empty() {
        return Some((false, String::new(), 0));
    }
    Some((negative, significant.to_string(), exponent))
}

fn check_length(key: &str, value: &str, max_chars: usize) -> DomainResult<()> {
    if value.chars().count() > max_chars {
        return Err(DomainError::validation(format!(
            "Invalid product: {key} longer than {max_chars}"
        )));
    }
    Ok(())
}

fn required<'a>(fields: &'a Map<String, Value>, key: &str) -> DomainResult<&'a Value> {
    fields
        .get(key)
        .ok_or_else(|| DomainError::validation(format!("Invalid product: missing {key}")))
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> DomainResult<&'a str> {
    match required(fields, key)? {
        Value::String(s) => Ok(s),
        other => Err(DomainError::validation(format!(
            "Invalid type for text [{key}]: {}",
            json_type(other)
        ))),
    }
}

fn price_field(value: &Value) -> DomainResult<Decimal> {
    let parsed = match value {
        // Go through the number's text so no binary float is involved.
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| {
        DomainError::validation(format!("Invalid product: price is not a valid decimal: {value}"))
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
