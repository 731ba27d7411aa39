//! Bracket-notation query strings.
//!
//! The content API encodes nested parameters the way `qs` does:
//! `filters[$and][0][date][$gte]=2025-01-01T00:00:00.000Z`. [`flatten`] turns a
//! JSON tree into such pairs (arrays become index-keyed objects), and
//! [`unflatten`] rebuilds the tree, turning objects keyed `0..n` back into
//! arrays.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Deepest bracket nesting accepted by [`unflatten`].
pub const MAX_DEPTH: usize = 8;

/// Flatten `value` into `(key, value)` pairs. `null` leaves are dropped.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
  let mut out = Vec::new();
  flatten_into("", value, &mut out);
  out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
  let child = |key: &str| {
    if prefix.is_empty() {
      key.to_owned()
    } else {
      format!("{prefix}[{key}]")
    }
  };
  match value {
    Value::Null => {}
    Value::String(s) => out.push((prefix.to_owned(), s.clone())),
    Value::Bool(_) | Value::Number(_) => {
      out.push((prefix.to_owned(), value.to_string()))
    }
    Value::Array(items) => {
      for (i, item) in items.iter().enumerate() {
        flatten_into(&child(&i.to_string()), item, out);
      }
    }
    Value::Object(map) => {
      for (k, v) in map {
        flatten_into(&child(k), v, out);
      }
    }
  }
}

/// Split `a[b][0]` into `["a", "b", "0"]`.
fn segments(key: &str) -> Result<Vec<&str>> {
  let (root, mut rest) = match key.find('[') {
    Some(i) => (&key[..i], &key[i..]),
    None => (key, ""),
  };
  if root.is_empty() {
    return Err(Error::InvalidQuery(format!("empty parameter name in {key:?}")));
  }
  let mut segs = vec![root];
  while !rest.is_empty() {
    let inner = rest
      .strip_prefix('[')
      .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])));
    match inner {
      Some((seg, tail)) if !seg.is_empty() => {
        segs.push(seg);
        rest = tail;
      }
      _ => {
        return Err(Error::InvalidQuery(format!("malformed brackets in {key:?}")));
      }
    }
  }
  if segs.len() > MAX_DEPTH {
    return Err(Error::InvalidQuery(format!("{key:?} is nested too deeply")));
  }
  Ok(segs)
}

/// Rebuild a JSON tree from bracket-notation pairs. Repeated keys collect into
/// an array.
pub fn unflatten<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Value>
where
  K: AsRef<str>,
  V: Into<String>,
{
  let mut root = Map::new();
  for (key, value) in pairs {
    let key = key.as_ref();
    let segs = segments(key)?;
    insert(&mut root, &segs, value.into(), key)?;
  }
  Ok(arrayify(Value::Object(root)))
}

fn insert(map: &mut Map<String, Value>, segs: &[&str], value: String, key: &str) -> Result<()> {
  let (head, tail) = match segs.split_first() {
    Some(split) => split,
    None => return Ok(()),
  };
  if tail.is_empty() {
    let Some(existing) = map.get_mut(*head) else {
      map.insert((*head).to_owned(), Value::String(value));
      return Ok(());
    };
    match existing {
      Value::String(prev) => {
        let prev = std::mem::take(prev);
        *existing = Value::Array(vec![Value::String(prev), Value::String(value)]);
      }
      Value::Array(items) => items.push(Value::String(value)),
      _ => {
        return Err(Error::InvalidQuery(format!("{key:?} conflicts with a nested parameter")));
      }
    }
    return Ok(());
  }
  let entry = map
    .entry((*head).to_owned())
    .or_insert_with(|| Value::Object(Map::new()));
  match entry {
    Value::Object(child) => insert(child, tail, value, key),
    _ => Err(Error::InvalidQuery(format!("{key:?} conflicts with a scalar parameter"))),
  }
}

/// Turn objects whose keys are exactly `0..n` into arrays, recursively.
fn arrayify(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let is_sequence = !map.is_empty()
        && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
      if is_sequence {
        let mut map = map;
        let items = (0..map.len())
          .filter_map(|i| map.remove(&i.to_string()))
          .map(arrayify)
          .collect();
        Value::Array(items)
      } else {
        Value::Object(map.into_iter().map(|(k, v)| (k, arrayify(v))).collect())
      }
    }
    Value::Array(items) => Value::Array(items.into_iter().map(arrayify).collect()),
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn flattens_nested_filters_and_arrays() {
    let tree = json!({
      "filters": { "$and": [ { "date": { "$gte": "2025-01-01" } } ] },
      "pagination": { "page": 2, "pageSize": 4 },
      "populate": { "cover": { "fields": ["url", "formats"] } },
      "skip": null,
    });
    let pairs = flatten(&tree);
    assert!(pairs.contains(&(
      "filters[$and][0][date][$gte]".into(),
      "2025-01-01".into()
    )));
    assert!(pairs.contains(&("pagination[page]".into(), "2".into())));
    assert!(pairs.contains(&("populate[cover][fields][1]".into(), "formats".into())));
    assert!(pairs.iter().all(|(k, _)| !k.starts_with("skip")));
  }

  #[test]
  fn unflatten_restores_index_keyed_arrays() {
    let tree = unflatten([
      ("filters[$and][1][date][$lte]", "b"),
      ("filters[$and][0][date][$gte]", "a"),
      ("locale", "en"),
    ])
    .unwrap();
    assert_eq!(
      tree,
      json!({
        "filters": { "$and": [
          { "date": { "$gte": "a" } },
          { "date": { "$lte": "b" } },
        ] },
        "locale": "en",
      })
    );
  }

  #[test]
  fn repeated_keys_collect_into_an_array() {
    let tree = unflatten([("sort", "date:desc"), ("sort", "name:asc")]).unwrap();
    assert_eq!(tree, json!({ "sort": ["date:desc", "name:asc"] }));
  }

  #[test]
  fn rejects_malformed_brackets() {
    assert!(unflatten([("filters[date", "x")]).is_err());
    assert!(unflatten([("filters[][x]", "x")]).is_err());
    assert!(unflatten([("[x]", "x")]).is_err());
    assert!(unflatten([("a", "1"), ("a[b]", "2")]).is_err());
  }
}
