use relata_core::{Record, Value};
use relata_registry::{Link, ResolvedRelation};
use relata_store::{RowId, Store};

use crate::error::ClientError;
use crate::include::Include;
use crate::node::{Included, Node};

type Result<T> = std::result::Result<T, ClientError>;

/// A row reached through a relation, with the join row that links it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedRow {
    pub id: RowId,
    /// Row of the explicit join entity. Implicit join rows are not exposed.
    pub pivot: Option<RowId>,
}

fn values_at(record: &Record, fields: &[String]) -> Option<Vec<Value>> {
    fields
        .iter()
        .map(|f| record.get(f).filter(|v| !v.is_null()).cloned())
        .collect()
}

fn filter(fields: &[String], values: Vec<Value>) -> Record {
    fields.iter().cloned().zip(values).collect()
}

/// Rows of `relation.target` linked to `record`, in target row order for
/// foreign-key mappings and join row order for join mappings.
pub fn related(store: &Store, relation: &ResolvedRelation, record: &Record) -> Result<Vec<RelatedRow>> {
    let rows = match &relation.link {
        Link::Owned {
            fields, references, ..
        } => {
            let Some(values) = values_at(record, fields) else {
                return Ok(Vec::new());
            };
            store
                .find_unique(&relation.target, references.as_slice(), &values)?
                .map(|id| RelatedRow { id, pivot: None })
                .into_iter()
                .collect()
        }
        Link::Inverse {
            fields, references, ..
        } => {
            let Some(values) = values_at(record, references) else {
                return Ok(Vec::new());
            };
            store
                .scan(&relation.target, &filter(fields, values))?
                .into_iter()
                .map(|(id, _)| RelatedRow { id, pivot: None })
                .collect()
        }
        Link::Join(join) => {
            let Some(values) = values_at(record, &join.source_references) else {
                return Ok(Vec::new());
            };
            let mut rows = Vec::new();
            for (join_id, join_row) in store.scan(&join.entity, &filter(&join.source_fields, values))? {
                let Some(target_values) = values_at(join_row, &join.target_fields) else {
                    continue;
                };
                if let Some(id) =
                    store.find_unique(&relation.target, join.target_references.as_slice(), &target_values)?
                {
                    rows.push(RelatedRow {
                        id,
                        pivot: (!join.implicit).then_some(join_id),
                    });
                }
            }
            rows
        }
    };
    Ok(rows)
}

/// Load a row as a [`Node`], resolving `include` recursively.
pub fn load_node(store: &Store, entity: &str, id: RowId, include: &Include) -> Result<Node> {
    let record = store
        .get(entity, id)
        .cloned()
        .ok_or_else(|| ClientError::RecordNotFound(entity.to_string(), id.to_string()))?;
    let registry = store.registry();

    let mut node = Node::new(entity, record);
    for (name, nested) in include.iter() {
        let relation = registry
            .relation(entity, name)
            .ok_or_else(|| ClientError::UnknownRelation(entity.to_string(), name.clone()))?;

        let mut children = Vec::new();
        for row in related(store, relation, &node.record)? {
            let mut child = load_node(store, &relation.target, row.id, nested)?;
            if let (Some(pivot), Link::Join(join)) = (row.pivot, &relation.link) {
                child.pivot = store.get(&join.entity, pivot).cloned();
            }
            children.push(child);
        }

        let included = if relation.is_to_many() {
            Included::Many(children)
        } else {
            Included::One(children.into_iter().next().map(Box::new))
        };
        node.relations.insert(name.clone(), included);
    }
    Ok(node)
}
