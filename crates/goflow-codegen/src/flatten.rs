//! Splicing embedded records into the records that embed them.

use std::collections::BTreeMap;

use log::debug;

use crate::error::{Error, Result};
use crate::model::{Field, RecordType};

/// A field ready for rendering.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FlatField<'a> {
    pub field: &'a Field,
    /// Whether the field came from an embedded record.
    pub spliced: bool,
}

/// Replace every embedded field of `owner` by the fields of its target,
/// recursively.
///
/// The traversal keeps the chain of records currently being expanded and
/// fails when a record shows up twice on it. Reaching the same record
/// through two different chains is fine.
pub(crate) fn flatten<'a>(
    owner: &'a str,
    fields: &'a [Field],
    records: &'a BTreeMap<String, RecordType>,
) -> Result<Vec<FlatField<'a>>> {
    let mut path = vec![owner];
    let mut out = Vec::with_capacity(fields.len());
    splice(fields, false, records, &mut path, &mut out)?;
    Ok(out)
}

fn splice<'a>(
    fields: &'a [Field],
    spliced: bool,
    records: &'a BTreeMap<String, RecordType>,
    path: &mut Vec<&'a str>,
    out: &mut Vec<FlatField<'a>>,
) -> Result<()> {
    for field in fields {
        let Some(target) = field.embed_target() else {
            out.push(FlatField { field, spliced });
            continue;
        };

        if path.contains(&target) {
            let mut chain: Vec<String> = path.iter().map(|s| s.to_string()).collect();
            chain.push(target.to_string());
            return Err(Error::CyclicEmbedding { chain });
        }

        let Some(record) = records.get(target) else {
            debug!("embedded record `{target}` is not declared, skipping");
            continue;
        };

        path.push(target);
        splice(&record.fields, true, records, path, out)?;
        path.pop();
    }
    Ok(())
}
