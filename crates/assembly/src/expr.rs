//! Property values that may refer to other resources.
//!
//! An [`Expr`] is either a literal or a reference that the provisioning
//! engine resolves at deploy time. References are plain data, so the registry
//! can check that every one of them points at a resource that was actually
//! registered (see [`crate::Stack::validate`]).

use serde_json::{json, Value};
use trust::LogicalId;

/// A template value: literal, intrinsic reference, or a join of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal string.
    Literal(String),
    /// The primary identifier of a resource (`{"Ref": id}`).
    Ref(LogicalId),
    /// A named attribute of a resource (`{"Fn::GetAtt": [id, attr]}`).
    GetAtt(LogicalId, String),
    /// Concatenation of the parts with no separator.
    Join(Vec<Expr>),
}

impl Expr {
    /// Creates a literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a join from parts.
    pub fn join(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Join(parts.into_iter().collect())
    }

    /// Logical ids this value depends on, in encounter order.
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a LogicalId>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Ref(id) | Expr::GetAtt(id, _) => out.push(id),
            Expr::Join(parts) => parts.iter().for_each(|p| p.collect_references(out)),
        }
    }

    /// Renders the value in template form.
    pub fn to_value(&self) -> Value {
        match self {
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Ref(id) => json!({ "Ref": id.as_str() }),
            Expr::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id.as_str(), attr] }),
            Expr::Join(parts) => {
                let rendered: Vec<Value> = parts.iter().map(Expr::to_value).collect();
                json!({ "Fn::Join": ["", rendered] })
            }
        }
    }
}

/// Handle to a registered resource, returned by [`crate::Stack::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef(LogicalId);

impl ResourceRef {
    pub(crate) fn new(id: LogicalId) -> Self {
        Self(id)
    }

    /// Logical id of the resource.
    pub fn logical_id(&self) -> &LogicalId {
        &self.0
    }

    /// The resource's primary identifier.
    pub fn to_expr(&self) -> Expr {
        Expr::Ref(self.0.clone())
    }

    /// A named attribute of the resource (e.g. `"Arn"`).
    pub fn attr(&self, attribute: impl Into<String>) -> Expr {
        Expr::GetAtt(self.0.clone(), attribute.into())
    }
}

impl From<ResourceRef> for Expr {
    fn from(r: ResourceRef) -> Self {
        Expr::Ref(r.0)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::literal(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}
