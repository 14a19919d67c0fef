//! Conversions between store rows and the typed records the service hands out.

use chatline_db::{AttributeValue, Result, Row, RowExt};
use chatline_types::models::{Message, ParticipantRow};

use crate::tables::{CONVERSATION_ID, MESSAGE, SENDER, TIMESTAMP, USERNAME};

pub fn participant_to_row(participant: &ParticipantRow) -> Row {
    Row::from([
        (CONVERSATION_ID.to_string(), AttributeValue::from(participant.conversation_id.as_str())),
        (USERNAME.to_string(), AttributeValue::from(participant.username.as_str())),
    ])
}

/// Both key attributes must be present, so queries feeding this have to
/// project them.
pub fn participant_from_row(row: &Row) -> Result<ParticipantRow> {
    Ok(ParticipantRow {
        conversation_id: row.get_str(CONVERSATION_ID)?.to_string(),
        username: row.get_str(USERNAME)?.to_string(),
    })
}

pub fn message_to_row(conversation_id: &str, message: &Message) -> Row {
    Row::from([
        (CONVERSATION_ID.to_string(), AttributeValue::from(conversation_id)),
        (TIMESTAMP.to_string(), AttributeValue::N(message.time)),
        (SENDER.to_string(), AttributeValue::from(message.sender.as_str())),
        (MESSAGE.to_string(), AttributeValue::from(message.message.as_str())),
    ])
}

pub fn message_from_row(row: &Row) -> Result<Message> {
    Ok(Message {
        sender: row.get_str(SENDER)?.to_string(),
        time: row.get_number(TIMESTAMP)?,
        message: row.get_str(MESSAGE)?.to_string(),
    })
}
