//! Field-level patch operations and the merge step of the patch pipeline.
//!
//! A patch document is an ordered list of JSON-Patch style operations. Only
//! `replace` and `add` are honoured, and only against top-level scalar fields
//! that already exist on the target view; `add` on an existing field behaves
//! as a set. Every operation is checked as it is applied and all problems
//! are collected, so a client sees the full list of violations at once.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::{violations_from, FieldViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
    Move,
    Copy,
    Test,
}

impl PatchOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
            PatchOp::Move => "move",
            PatchOp::Copy => "copy",
            PatchOp::Test => "test",
        }
    }
}

/// One operation of a patch document.
///
/// A missing `value` is read as `null`, which clears an optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of operations, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

impl PatchDocument {
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PatchOperation>> for PatchDocument {
    fn from(ops: Vec<PatchOperation>) -> Self {
        Self(ops)
    }
}

/// Apply `ops` in order to a copy of `view`, then validate the result.
///
/// Operations that fail their own checks are skipped and reported; the
/// remaining ones still apply so model-level validation sees as much of the
/// intended state as possible. Returns the merged view only if there were no
/// violations at all.
pub fn merge<T>(view: &T, ops: &[PatchOperation]) -> Result<T, Vec<FieldViolation>>
where
    T: Serialize + DeserializeOwned + Validate,
{
    merge_with_fixed(view, ops, &[])
}

/// Like [`merge`], but any operation that would change one of the `fixed`
/// fields is reported alongside the other violations. Setting a fixed field
/// to its current value is allowed.
pub fn merge_with_fixed<T>(
    view: &T,
    ops: &[PatchOperation],
    fixed: &[&str],
) -> Result<T, Vec<FieldViolation>>
where
    T: Serialize + DeserializeOwned + Validate,
{
    let mut doc = match serde_json::to_value(view) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(vec![FieldViolation::new("", "patch target is not an object")]),
        Err(e) => return Err(vec![FieldViolation::new("", e.to_string())]),
    };

    let mut violations: Vec<FieldViolation> = ops
        .iter()
        .filter_map(|op| apply_operation::<T>(&mut doc, op, fixed).err())
        .collect();

    let merged: T = serde_json::from_value(Value::Object(doc))
        .map_err(|e| vec![FieldViolation::new("", e.to_string())])?;

    if let Err(errors) = merged.validate() {
        violations.extend(violations_from(&errors));
    }

    if violations.is_empty() {
        Ok(merged)
    } else {
        Err(violations)
    }
}

fn apply_operation<T: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    op: &PatchOperation,
    fixed: &[&str],
) -> Result<(), FieldViolation> {
    let field = field_name(&op.path)?;

    if !matches!(op.op, PatchOp::Add | PatchOp::Replace) {
        return Err(FieldViolation::new(
            &field,
            format!("operation `{}` is not supported", op.op.as_str()),
        ));
    }
    if !doc.contains_key(&field) {
        return Err(FieldViolation::new(&field, "field does not exist"));
    }
    if op.value.is_object() || op.value.is_array() {
        return Err(FieldViolation::new(&field, "only scalar values can be set"));
    }
    if fixed.contains(&field.as_str()) && doc.get(&field) != Some(&op.value) {
        return Err(FieldViolation::new(&field, "identifier cannot be changed"));
    }

    // Shape check: the candidate document must still deserialize as `T`.
    let mut candidate = doc.clone();
    candidate.insert(field.clone(), op.value.clone());
    if let Err(e) = serde_json::from_value::<T>(Value::Object(candidate)) {
        return Err(FieldViolation::new(&field, format!("invalid value: {e}")));
    }

    doc.insert(field, op.value.clone());
    Ok(())
}

/// Resolve a JSON pointer to a single top-level member name.
fn field_name(path: &str) -> Result<String, FieldViolation> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(FieldViolation::new(path, "path must start with '/'"));
    };
    if rest.is_empty() || rest.contains('/') {
        return Err(FieldViolation::new(path, "path must name a top-level field"));
    }
    Ok(rest.replace("~1", "/").replace("~0", "~"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
    struct View {
        id: i64,
        #[validate(length(min = 1, max = 30, message = "name must be 1-30 characters"))]
        name: String,
        #[validate(range(min = 0))]
        occupancy: i32,
        details: Option<String>,
    }

    fn view() -> View {
        View {
            id: 4,
            name: "Pool View".into(),
            occupancy: 4,
            details: Some("corner unit".into()),
        }
    }

    fn ops(value: Value) -> Vec<PatchOperation> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn replace_sets_field_and_leaves_others() {
        let merged = merge(&view(), &[PatchOperation::replace("/name", "Ocean Dream")]).unwrap();
        assert_eq!(merged.name, "Ocean Dream");
        assert_eq!(merged.occupancy, 4);
        assert_eq!(merged.details.as_deref(), Some("corner unit"));
    }

    #[test]
    fn operations_apply_in_order() {
        let merged = merge(
            &view(),
            &ops(json!([
                {"op": "replace", "path": "/occupancy", "value": 2},
                {"op": "add", "path": "/occupancy", "value": 6}
            ])),
        )
        .unwrap();
        assert_eq!(merged.occupancy, 6);
    }

    #[test]
    fn null_clears_optional_field() {
        let merged = merge(&view(), &ops(json!([{"op": "replace", "path": "/details"}]))).unwrap();
        assert_eq!(merged.details, None);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = merge(&view(), &[PatchOperation::replace("/colour", "blue")]).unwrap_err();
        assert_eq!(err, vec![FieldViolation::new("colour", "field does not exist")]);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let err = merge(&view(), &[PatchOperation::replace("/occupancy", "lots")]).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].field, "occupancy");
        assert!(err[0].message.starts_with("invalid value"));
    }

    #[test]
    fn nested_and_unsupported_operations_are_rejected() {
        let err = merge(
            &view(),
            &ops(json!([
                {"op": "replace", "path": "/name/first", "value": "x"},
                {"op": "remove", "path": "/details"},
                {"op": "replace", "path": "/name", "value": {"a": 1}}
            ])),
        )
        .unwrap_err();
        assert_eq!(err.len(), 3);
        assert_eq!(err[1].message, "operation `remove` is not supported");
        assert_eq!(err[2].message, "only scalar values can be set");
    }

    #[test]
    fn all_violations_are_collected_including_model_rules() {
        let err = merge(
            &view(),
            &ops(json!([
                {"op": "replace", "path": "/name", "value": ""},
                {"op": "replace", "path": "/missing", "value": 1},
                {"op": "replace", "path": "/occupancy", "value": -3}
            ])),
        )
        .unwrap_err();
        let fields: Vec<&str> = err.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["missing", "name", "occupancy"]);
        assert_eq!(err[1].message, "name must be 1-30 characters");
    }

    #[test]
    fn fixed_field_change_is_collected_with_other_violations() {
        let err = merge_with_fixed(
            &view(),
            &ops(json!([
                {"op": "replace", "path": "/id", "value": 9},
                {"op": "replace", "path": "/details", "value": {"x": 1}}
            ])),
            &["id"],
        )
        .unwrap_err();
        assert_eq!(
            err,
            vec![
                FieldViolation::new("id", "identifier cannot be changed"),
                FieldViolation::new("details", "only scalar values can be set"),
            ]
        );
    }

    #[test]
    fn fixed_field_set_to_current_value_is_allowed() {
        let merged = merge_with_fixed(
            &view(),
            &[
                PatchOperation::replace("/id", 4),
                PatchOperation::replace("/occupancy", 1),
            ],
            &["id"],
        )
        .unwrap();
        assert_eq!(merged.id, 4);
        assert_eq!(merged.occupancy, 1);
    }

    #[test]
    fn escaped_pointer_segments_are_decoded() {
        assert_eq!(field_name("/a~1b").unwrap(), "a/b");
        assert_eq!(field_name("/a~0b").unwrap(), "a~b");
        assert!(field_name("name").is_err());
        assert!(field_name("/").is_err());
    }

    #[test]
    fn empty_document_returns_unchanged_view() {
        let doc = PatchDocument::default();
        assert!(doc.is_empty());
        assert_eq!(merge(&view(), doc.operations()).unwrap(), view());
    }
}
