use {
    crate::{
        COUNTER_COLLECTION, DirectoryError, DirectoryResult, Fields, MANAGERS_COLLECTION,
        PARTICIPATION_COLLECTION, Value,
    },
    std::{collections::BTreeMap, str::FromStr},
    tally_types::{
        Address, GroupId, ManagerRecord, ParticipationEntry, VoteCounter, VoteId, document_id,
    },
};

pub(crate) const ADDRESS_FIELD: &str = "address";
pub(crate) const CONTRACT_FIELD: &str = "contractAddress";
pub(crate) const GROUP_FIELD: &str = "group";
pub(crate) const VOTES_FIELD: &str = "votes";
pub(crate) const VOTE_ID_FIELD: &str = "voteID";
pub(crate) const VOTE_NAME_FIELD: &str = "voteName";
pub(crate) const COUNTER_FIELD: &str = "currentID";

// ---------------------------------- manager ----------------------------------

pub(crate) fn manager_to_fields(record: &ManagerRecord) -> Fields {
    let groups = record
        .groups
        .iter()
        .map(|(group, members)| {
            let members = members.iter().map(|member| Value::string(document_id(member)));
            (group.to_string(), Value::array(members))
        })
        .collect();

    BTreeMap::from([
        (ADDRESS_FIELD.to_string(), Value::string(document_id(&record.address))),
        (
            CONTRACT_FIELD.to_string(),
            Value::string(document_id(&record.contract_address)),
        ),
        (GROUP_FIELD.to_string(), Value::map(groups)),
    ])
}

pub(crate) fn manager_from_fields(id: &str, fields: &Fields) -> DirectoryResult<ManagerRecord> {
    let malformed = |reason: String| DirectoryError::malformed(MANAGERS_COLLECTION, id, reason);

    // Older records don't repeat the address inside the document, in which
    // case the document id is authoritative.
    let address = match fields.get(ADDRESS_FIELD) {
        Some(value) => parse_address(value)
            .map_err(|reason| malformed(format!("`{ADDRESS_FIELD}`: {reason}")))?,
        None => Address::from_str(id).map_err(|err| malformed(format!("document id: {err}")))?,
    };

    let contract_address = fields
        .get(CONTRACT_FIELD)
        .ok_or_else(|| malformed(format!("missing `{CONTRACT_FIELD}`")))
        .and_then(|value| {
            parse_address(value)
                .map_err(|reason| malformed(format!("`{CONTRACT_FIELD}`: {reason}")))
        })?;

    let mut groups = BTreeMap::new();

    if let Some(value) = fields.get(GROUP_FIELD) {
        let map = value
            .as_map()
            .ok_or_else(|| malformed(format!("`{GROUP_FIELD}` is not a map")))?;

        for (key, members) in map {
            let group = GroupId::from_str(key)
                .map_err(|err| malformed(format!("group id `{key}`: {err}")))?;

            let members = members
                .as_array()
                .ok_or_else(|| malformed(format!("group `{key}` is not an array")))?
                .iter()
                .map(parse_address)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| malformed(format!("group `{key}`: {reason}")))?;

            groups.insert(group, members);
        }
    }

    Ok(ManagerRecord {
        address,
        contract_address,
        groups,
    })
}

// ------------------------------- participation -------------------------------

pub(crate) fn participation_entry_to_value(entry: &ParticipationEntry) -> Value {
    Value::map(BTreeMap::from([
        (VOTE_ID_FIELD.to_string(), Value::from(entry.vote_id.into_inner())),
        (VOTE_NAME_FIELD.to_string(), Value::string(entry.vote_name.clone())),
    ]))
}

pub(crate) fn participation_from_fields(
    id: &str,
    fields: &Fields,
) -> DirectoryResult<Vec<ParticipationEntry>> {
    let malformed =
        |reason: String| DirectoryError::malformed(PARTICIPATION_COLLECTION, id, reason);

    let Some(votes) = fields.get(VOTES_FIELD) else {
        return Ok(Vec::new());
    };

    votes
        .as_array()
        .ok_or_else(|| malformed(format!("`{VOTES_FIELD}` is not an array")))?
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let entry = value
                .as_map()
                .ok_or_else(|| malformed(format!("entry {index} is not a map")))?;

            let vote_id = entry
                .get(VOTE_ID_FIELD)
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    malformed(format!("entry {index}: missing or invalid `{VOTE_ID_FIELD}`"))
                })?;

            let vote_name = entry
                .get(VOTE_NAME_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("entry {index}: missing `{VOTE_NAME_FIELD}`")))?;

            Ok(ParticipationEntry::new(VoteId(vote_id), vote_name))
        })
        .collect()
}

// ---------------------------------- counter ----------------------------------

pub(crate) fn counter_to_fields(counter: VoteCounter) -> Fields {
    BTreeMap::from([(COUNTER_FIELD.to_string(), Value::from(counter.current_id))])
}

pub(crate) fn counter_from_fields(id: &str, fields: &Fields) -> DirectoryResult<VoteCounter> {
    fields
        .get(COUNTER_FIELD)
        .and_then(Value::as_u64)
        .map(|current_id| VoteCounter { current_id })
        .ok_or_else(|| {
            DirectoryError::malformed(
                COUNTER_COLLECTION,
                id,
                format!("missing or invalid `{COUNTER_FIELD}`"),
            )
        })
}

fn parse_address(value: &Value) -> Result<Address, String> {
    let s = value.as_str().ok_or("expecting a string")?;

    Address::from_str(s.trim()).map_err(|err| format!("invalid address `{s}`: {err}"))
}
