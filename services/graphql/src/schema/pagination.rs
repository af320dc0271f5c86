//! Relay cursor pagination over in-memory result lists

use async_graphql::{
    OutputType,
    connection::{Connection, Edge},
};
use base64::{Engine as _, engine::general_purpose};

/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: i32 = 100;

/// Opaque cursor format: base64("offset:<n>")
pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(offset: usize) -> String {
        general_purpose::STANDARD.encode(format!("offset:{offset}"))
    }

    pub fn decode(cursor: &str) -> Result<usize, String> {
        let decoded = general_purpose::STANDARD
            .decode(cursor)
            .map_err(|e| format!("Invalid cursor format: {}", e))?;
        let cursor_str =
            String::from_utf8(decoded).map_err(|e| format!("Cursor not valid UTF-8: {}", e))?;

        cursor_str
            .strip_prefix("offset:")
            .ok_or_else(|| "Unknown cursor format".to_string())?
            .parse()
            .map_err(|e| format!("Invalid offset: {}", e))
    }
}

/// Slice `items` into a connection
///
/// `after` excludes everything up to and including its item; a missing
/// `first` returns every remaining item.
pub fn paginate<T: OutputType>(
    items: Vec<T>,
    first: Option<i32>,
    after: Option<String>,
) -> async_graphql::Result<Connection<String, T>> {
    let limit = match first {
        Some(first) if !(0..=MAX_PAGE_SIZE).contains(&first) => {
            return Err(format!("'first' must be between 0 and {MAX_PAGE_SIZE}").into());
        }
        Some(first) => Some(first as usize),
        None => None,
    };
    let start = match after.as_deref() {
        Some(cursor) => CursorCodec::decode(cursor)?.saturating_add(1),
        None => 0,
    };

    let total = items.len();
    let start = start.min(total);
    let end = limit.map_or(total, |limit| start.saturating_add(limit).min(total));

    let mut connection = Connection::new(start > 0, end < total);
    connection.edges.extend(
        items
            .into_iter()
            .enumerate()
            .skip(start)
            .take(end - start)
            .map(|(offset, item)| Edge::new(CursorCodec::encode(offset), item)),
    );
    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursors(connection: &Connection<String, i32>) -> Vec<usize> {
        connection
            .edges
            .iter()
            .map(|edge| CursorCodec::decode(edge.cursor.as_str()).unwrap())
            .collect()
    }

    #[test]
    fn test_cursor_codec() {
        assert_eq!(CursorCodec::encode(3), "b2Zmc2V0OjM=");
        assert_eq!(CursorCodec::decode("b2Zmc2V0OjM=").unwrap(), 3);
        assert!(CursorCodec::decode("!!!").is_err());
        assert!(CursorCodec::decode(&general_purpose::STANDARD.encode("id:3")).is_err());
    }

    #[test]
    fn test_pages_walk_the_list() {
        let items: Vec<i32> = (0..5).collect();

        let page = paginate(items.clone(), Some(2), None).unwrap();
        assert_eq!(cursors(&page), vec![0, 1]);
        assert!(page.has_next_page);
        assert!(!page.has_previous_page);

        let after = page.edges.last().map(|edge| edge.cursor.as_str().to_string());
        let page = paginate(items.clone(), Some(2), after).unwrap();
        assert_eq!(cursors(&page), vec![2, 3]);
        assert!(page.has_previous_page);

        let after = page.edges.last().map(|edge| edge.cursor.as_str().to_string());
        let page = paginate(items, None, after).unwrap();
        assert_eq!(cursors(&page), vec![4]);
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_first_bounds() {
        assert!(paginate(vec![1], Some(-1), None).is_err());
        assert!(paginate(vec![1], Some(101), None).is_err());

        let empty = paginate(vec![1, 2], Some(0), None).unwrap();
        assert!(empty.edges.is_empty());
        assert!(empty.has_next_page);
    }

    #[test]
    fn test_cursor_past_the_end() {
        let page = paginate(vec![1, 2], None, Some(CursorCodec::encode(10))).unwrap();
        assert!(page.edges.is_empty());
        assert!(!page.has_next_page);
    }
}
