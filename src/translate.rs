//! Translation between raw filename tokens and semantic (STAC) fields
//!
//! `expand` runs after matching and adds the semantic fields a token stands
//! for. `collapse` runs before assembly and recovers the token from whatever
//! the caller supplied. Fields without a `stac_map` pass through untouched.

use std::collections::BTreeMap;

use regex::Captures;

use crate::error::{Result, SchemaError};
use crate::schema::{FieldMap, FieldSpec, GroupTemplate, SchemaDocument, StacMap};

/// Add the semantic fields for every token in `tokens`, returning the union
pub fn expand_all(doc: &SchemaDocument, tokens: &FieldMap) -> FieldMap {
    let mut out = tokens.clone();
    for name in doc.template().fields_order() {
        if let (Some(spec), Some(raw)) = (doc.field(&name), tokens.get(&name)) {
            expand(spec, raw, &mut out);
        }
    }
    out
}

/// Write the semantic fields derived from one raw token into `out`
pub fn expand(spec: &FieldSpec, raw: &str, out: &mut FieldMap) {
    let Some(map) = spec.translation() else {
        return;
    };
    if let Some(alias) = map.preserve_original_as() {
        out.insert(alias.to_string(), raw.to_string());
    }
    match map {
        StacMap::Enumeration { values, .. } => {
            if let Some(targets) = values.get(raw) {
                out.extend(targets.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        StacMap::Capture { groups, .. } => {
            let Some(caps) = spec.matcher().captures(raw) else {
                return;
            };
            for (target, template) in groups {
                if let Some(value) = template.render(|i| group_text(&caps, i)) {
                    out.insert(target.clone(), value);
                }
            }
        }
    }
}

/// Resolve the raw token for every field of `doc` that can be resolved.
///
/// Fields the caller gave no information about are simply absent from the
/// result; whether that is acceptable is the assembler's call.
pub fn collapse_all(doc: &SchemaDocument, supplied: &FieldMap) -> Result<FieldMap> {
    let mut tokens = FieldMap::new();
    for name in doc.template().fields_order() {
        let Some(spec) = doc.field(&name) else {
            continue;
        };
        if let Some(raw) = collapse(doc.schema_id(), spec, supplied)? {
            tokens.insert(name, raw);
        }
    }
    Ok(tokens)
}

/// Recover the raw token for `spec` from caller-supplied fields.
///
/// Order: the preserved-original alias, then the token itself, then a
/// search through the mapping.
pub fn collapse(schema_id: &str, spec: &FieldSpec, supplied: &FieldMap) -> Result<Option<String>> {
    let map = spec.translation();
    if let Some(raw) = map.and_then(StacMap::preserve_original_as).and_then(|alias| supplied.get(alias)) {
        return Ok(Some(raw.clone()));
    }
    if let Some(raw) = supplied.get(spec.name()) {
        return Ok(Some(raw.clone()));
    }
    let Some(map) = map else {
        return Ok(None);
    };

    let fail = |reason: String| SchemaError::AmbiguousOrUnknownMapping {
        schema_id: schema_id.to_string(),
        field: spec.name().to_string(),
        reason,
    };

    match map {
        StacMap::Enumeration { values, .. } => collapse_enumeration(map, values, supplied).map_err(fail),
        StacMap::Capture { groups, raw, .. } => {
            collapse_capture(spec, groups, raw.as_ref(), supplied).map_err(fail)
        }
    }
}

fn collapse_enumeration(
    map: &StacMap,
    values: &BTreeMap<String, FieldMap>,
    supplied: &FieldMap,
) -> std::result::Result<Option<String>, String> {
    let present: FieldMap = map
        .targets()
        .into_iter()
        .filter_map(|target| supplied.get(target).map(|v| (target.to_string(), v.clone())))
        .collect();
    if present.is_empty() {
        return Ok(None);
    }

    let matches: Vec<&String> = values
        .iter()
        .filter(|(_, targets)| !targets.is_empty() && **targets == present)
        .map(|(token, _)| token)
        .collect();

    match matches.as_slice() {
        [token] => Ok(Some((*token).clone())),
        [] => Err(format!("no value maps to {}", render_pairs(&present))),
        many => Err(format!(
            "{} all map to {}",
            many.iter().map(|t| format!("{t:?}")).collect::<Vec<_>>().join(", "),
            render_pairs(&present)
        )),
    }
}

fn collapse_capture(
    spec: &FieldSpec,
    groups: &BTreeMap<String, GroupTemplate>,
    raw_template: Option<&GroupTemplate>,
    supplied: &FieldMap,
) -> std::result::Result<Option<String>, String> {
    let present: Vec<(&String, &GroupTemplate, &String)> = groups
        .iter()
        .filter_map(|(target, template)| supplied.get(target).map(|value| (target, template, value)))
        .collect();
    if present.is_empty() {
        return Ok(None);
    }
    if present.len() < groups.len() {
        let missing: Vec<&str> = groups
            .keys()
            .filter(|target| !supplied.contains_key(*target))
            .map(String::as_str)
            .collect();
        return Err(format!("needs {} as well", missing.join(", ")));
    }

    let mut recovered: BTreeMap<usize, String> = BTreeMap::new();
    for (target, template, value) in &present {
        let caps = template
            .reverse()
            .captures(value)
            .ok_or_else(|| format!("{target}={value:?} does not fit {:?}", template.source()))?;
        for (position, index) in template.group_indices().enumerate() {
            let text = caps.get(position + 1).map_or("", |m| m.as_str());
            match recovered.get(&index) {
                Some(existing) if existing != text => {
                    return Err(format!("${index} is both {existing:?} and {text:?}"));
                }
                Some(_) => {}
                None => {
                    recovered.insert(index, text.to_string());
                }
            }
        }
    }

    let raw = match (recovered.get(&0), raw_template) {
        (Some(whole), _) => whole.clone(),
        (None, Some(template)) => template
            .render(|i| recovered.get(&i).map(String::as_str))
            .ok_or_else(|| format!("cannot rebuild the token from {:?}", template.source()))?,
        (None, None) => return Err("mapping has no way to rebuild the token".to_string()),
    };

    // The lazy reverse match may split values differently from the field
    // pattern; re-expanding is the authority on consistency.
    let caps = spec
        .matcher()
        .captures(&raw)
        .ok_or_else(|| format!("rebuilt token {raw:?} is not a valid value"))?;
    for (target, template, value) in &present {
        let expected = template.render(|i| group_text(&caps, i));
        if expected.as_deref() != Some(value.as_str()) {
            return Err(format!("{target}={value:?} conflicts with token {raw:?}"));
        }
    }
    Ok(Some(raw))
}

fn group_text<'h>(caps: &Captures<'h>, index: usize) -> Option<&'h str> {
    if index >= caps.len() {
        return None;
    }
    Some(caps.get(index).map_or("", |m| m.as_str()))
}

fn render_pairs(fields: &FieldMap) -> String {
    let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v:?}")).collect();
    format!("{{{}}}", pairs.join(", "))
}
