mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)]
// ============================================================================

/// Derive macro for types held in an `EntityStore`.
///
/// ```ignore
/// #[derive(Clone, Debug, Serialize, Deserialize, Record)]
/// #[record(collection = "questions")]
/// pub struct Question {
///     #[record(id)]
///     pub id: u64,
///     pub votes_score: i64,
/// }
/// ```
///
/// - `collection` defaults to the snake_case struct name plus `s`.
/// - The id field defaults to a field named `id` and must be a `votefeed::Id`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
