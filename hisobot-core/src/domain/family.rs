//! Family sharing entity
//!
//! One row per member: `(familyId, inviteCode, memberId, memberName,
//! familyName)`. Aggregation reads across the member-id set but never
//! mutates another member's records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub family_id: String,
    pub invite_code: String,
    pub member_id: String,
    pub member_name: String,
    pub family_name: String,
}
