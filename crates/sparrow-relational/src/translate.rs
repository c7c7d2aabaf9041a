use std::sync::Arc;

use arrow_schema::DataType;

use crate::{Error, ExprBuilder, ExprRef, Literal};

/// Identifies a method called in the source query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    /// The type declaring the method, such as `String`.
    pub owner: String,
    pub name: String,
}

impl MethodIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Translates method calls from the source query into expressions.
pub trait MethodCallTranslator: Send + Sync {
    /// Translate a call to `method`.
    ///
    /// Returns `Ok(None)` if this translator does not handle the call.
    fn translate(
        &self,
        instance: Option<&ExprRef>,
        method: &MethodIdentity,
        args: &[ExprRef],
    ) -> error_stack::Result<Option<ExprRef>, Error>;
}

/// Translates `x.Equals(y)` and `Equals(x, y)` into `x = y`.
pub struct EqualsTranslator {
    builder: Arc<dyn ExprBuilder>,
}

impl EqualsTranslator {
    pub fn new(builder: Arc<dyn ExprBuilder>) -> Self {
        Self { builder }
    }
}

impl MethodCallTranslator for EqualsTranslator {
    fn translate(
        &self,
        instance: Option<&ExprRef>,
        method: &MethodIdentity,
        args: &[ExprRef],
    ) -> error_stack::Result<Option<ExprRef>, Error> {
        if method.name != "Equals" {
            return Ok(None);
        }
        let (left, right) = match (instance, args) {
            (Some(instance), [arg]) => (instance, arg),
            (None, [left, right]) => (left, right),
            _ => return Ok(None),
        };
        let translated = self.builder.equal(left.clone(), right.clone())?;
        Ok(Some(translated))
    }
}

const LIKE_ESCAPE: char = '\\';

/// Translates `StartsWith`, `EndsWith` and `Contains` on strings into `LIKE`.
///
/// Only constant arguments are translated, since the wildcards in the
/// argument need to be escaped when building the pattern.
pub struct StringMatchTranslator {
    builder: Arc<dyn ExprBuilder>,
}

impl StringMatchTranslator {
    pub fn new(builder: Arc<dyn ExprBuilder>) -> Self {
        Self { builder }
    }
}

impl MethodCallTranslator for StringMatchTranslator {
    fn translate(
        &self,
        instance: Option<&ExprRef>,
        method: &MethodIdentity,
        args: &[ExprRef],
    ) -> error_stack::Result<Option<ExprRef>, Error> {
        if method.owner != "String" {
            return Ok(None);
        }
        let (Some(instance), [arg]) = (instance, args) else {
            return Ok(None);
        };
        let Some(Literal::String(needle)) = arg.literal_opt() else {
            return Ok(None);
        };

        let escaped = escape_like(needle);
        let pattern = match method.name.as_str() {
            "StartsWith" => format!("{escaped}%"),
            "EndsWith" => format!("%{escaped}"),
            "Contains" => format!("%{escaped}%"),
            _ => return Ok(None),
        };
        let escape = if escaped.len() != needle.len() {
            Some(
                self.builder
                    .constant(Literal::String(LIKE_ESCAPE.to_string()), DataType::Utf8)?,
            )
        } else {
            None
        };
        let pattern = self
            .builder
            .constant(Literal::String(pattern), DataType::Utf8)?;
        let translated = self.builder.like(instance.clone(), pattern, escape)?;
        Ok(Some(translated))
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Tries each registered translator in order, returning the first translation.
#[derive(Default)]
pub struct CompositeMethodCallTranslator {
    translators: Vec<Box<dyn MethodCallTranslator>>,
}

impl CompositeMethodCallTranslator {
    /// Create a translator with the built-in translations registered.
    pub fn with_defaults(builder: Arc<dyn ExprBuilder>) -> Self {
        let mut translator = Self::default();
        translator.add(EqualsTranslator::new(builder.clone()));
        translator.add(StringMatchTranslator::new(builder));
        translator
    }

    pub fn add(&mut self, translator: impl MethodCallTranslator + 'static) {
        self.translators.push(Box::new(translator));
    }
}

impl MethodCallTranslator for CompositeMethodCallTranslator {
    fn translate(
        &self,
        instance: Option<&ExprRef>,
        method: &MethodIdentity,
        args: &[ExprRef],
    ) -> error_stack::Result<Option<ExprRef>, Error> {
        for translator in &self.translators {
            if let Some(translated) = translator.translate(instance, method, args)? {
                return Ok(Some(translated));
            }
        }
        Ok(None)
    }
}
