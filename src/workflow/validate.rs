use crate::storage::ItemId;
use crate::workflow::error::StageError;

/// Require a non-blank item identifier. Touches nothing else.
pub fn require_item_id(raw: Option<&str>) -> Result<ItemId, StageError> {
    raw.and_then(ItemId::parse)
        .ok_or(StageError::MissingIdentifier)
}
