use crate::{
    db::parse::words::normalize,
    model::{AttributePath, FieldKind, FieldModel},
};

///
/// ResolvedPath
/// Attribute path plus the kind of its final attribute.
///

#[derive(Clone, Debug)]
pub(crate) struct ResolvedPath {
    pub(crate) path: AttributePath,
    pub(crate) kind: FieldKind,
}

/// Resolve method-name words to an attribute path.
///
/// Precedence at every level:
/// 1. all remaining words name one attribute literally;
/// 2. otherwise the longest word prefix naming an embedded attribute,
///    traversing into it and backtracking to shorter prefixes when the
///    rest does not resolve.
pub(crate) fn resolve_path(
    fields: &'static [FieldModel],
    words: &[String],
) -> Option<ResolvedPath> {
    let (segments, kind) = resolve_segments(fields, words)?;

    Some(ResolvedPath {
        path: AttributePath::from_segments(segments),
        kind,
    })
}

fn resolve_segments(
    fields: &'static [FieldModel],
    words: &[String],
) -> Option<(Vec<String>, FieldKind)> {
    if words.is_empty() {
        return None;
    }

    let joined = words.concat();
    if let Some(field) = lookup(fields, &joined) {
        return Some((vec![field.name.to_string()], field.kind));
    }

    for split in (1..words.len()).rev() {
        let Some(field) = lookup(fields, &words[..split].concat()) else {
            continue;
        };
        let FieldKind::Embedded(nested) = field.kind else {
            continue;
        };

        if let Some((mut rest, kind)) = resolve_segments(nested, &words[split..]) {
            rest.insert(0, field.name.to_string());
            return Some((rest, kind));
        }
    }

    None
}

fn lookup(fields: &'static [FieldModel], normalized: &str) -> Option<&'static FieldModel> {
    fields.iter().find(|field| normalize(field.name) == normalized)
}
