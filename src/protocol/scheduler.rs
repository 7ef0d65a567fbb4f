//! Task scheduler sub-protocol: record message sequences on the board and
//! replay them on a schedule.
//!
//! <https://github.com/firmata/protocol/blob/master/scheduler.md>

use crate::protocol::encoding::{encode_14bit, pack_as_7bit, unpack_from_7bit};
use crate::protocol::session::Session;

// Sub-commands.
pub const SCHEDULER_CREATE_TASK: u8 = 0;
pub const SCHEDULER_DELETE_TASK: u8 = 1;
pub const SCHEDULER_ADD_TO_TASK: u8 = 2;
pub const SCHEDULER_DELAY_TASK: u8 = 3;
pub const SCHEDULER_SCHEDULE_TASK: u8 = 4;
pub const SCHEDULER_QUERY_ALL_TASKS: u8 = 5;
pub const SCHEDULER_QUERY_TASK: u8 = 6;
pub const SCHEDULER_RESET: u8 = 7;
// Replies.
pub const SCHEDULER_ERROR_TASK_REPLY: u8 = 8;
pub const SCHEDULER_QUERY_ALL_TASKS_REPLY: u8 = 9;
pub const SCHEDULER_QUERY_TASK_REPLY: u8 = 10;

/// State of one board task. The body is absent in the short reply form that
/// only acknowledges the task id.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerTask {
    pub id: u8,
    pub body: Option<SchedulerTaskBody>,
}

/// The long reply form: execution time, buffer geometry and the recorded
/// message bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerTaskBody {
    /// Next execution time, in milliseconds since boot.
    pub time_ms: u32,
    /// Allocated buffer length.
    pub length: u16,
    /// Current write position inside the buffer.
    pub position: u16,
    /// Recorded message bytes.
    pub messages: Vec<u8>,
}

/// A decoded scheduler response.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerReply {
    /// The board rejected a request touching this task.
    ErrorReply { task: SchedulerTask },
    /// Ids of every task currently defined.
    QueryAllReply { ids: Vec<u8> },
    /// State of one queried task.
    QueryOneReply { task: SchedulerTask },
}

impl Session {
    /// Allocates a task buffer of `length` bytes under `id`.
    pub fn scheduler_create_task(&self, id: u8, length: u16) -> Vec<u8> {
        let mut payload = vec![SCHEDULER_CREATE_TASK, id];
        payload.extend(encode_14bit(length));
        self.sysex_command("SCHEDULER_DATA", &payload)
    }

    /// Deletes the task under `id`.
    pub fn scheduler_delete_task(&self, id: u8) -> Vec<u8> {
        self.sysex_command("SCHEDULER_DATA", &[SCHEDULER_DELETE_TASK, id])
    }

    /// Appends message bytes to the task buffer under `id`.
    pub fn scheduler_add_to_task(&self, id: u8, messages: &[u8]) -> Vec<u8> {
        let mut payload = vec![SCHEDULER_ADD_TO_TASK, id];
        payload.extend(pack_as_7bit(messages));
        self.sysex_command("SCHEDULER_DATA", &payload)
    }

    /// Delays the running task by `time_ms` milliseconds.
    pub fn scheduler_delay(&self, time_ms: u32) -> Vec<u8> {
        let mut payload = vec![SCHEDULER_DELAY_TASK];
        payload.extend(pack_as_7bit(&time_ms.to_le_bytes()));
        self.sysex_command("SCHEDULER_DATA", &payload)
    }

    /// Schedules the task under `id` to run in `time_ms` milliseconds.
    pub fn scheduler_schedule_task(&self, id: u8, time_ms: u32) -> Vec<u8> {
        let mut payload = vec![SCHEDULER_SCHEDULE_TASK, id];
        payload.extend(pack_as_7bit(&time_ms.to_le_bytes()));
        self.sysex_command("SCHEDULER_DATA", &payload)
    }

    /// Asks for the ids of every defined task.
    pub fn scheduler_query_all_tasks(&self) -> Vec<u8> {
        self.sysex_command("SCHEDULER_DATA", &[SCHEDULER_QUERY_ALL_TASKS])
    }

    /// Asks for the state of the task under `id`.
    pub fn scheduler_query_task(&self, id: u8) -> Vec<u8> {
        self.sysex_command("SCHEDULER_DATA", &[SCHEDULER_QUERY_TASK, id])
    }

    /// Deletes every task and stops the scheduler.
    pub fn scheduler_reset(&self) -> Vec<u8> {
        self.sysex_command("SCHEDULER_DATA", &[SCHEDULER_RESET])
    }
}

/// Decodes a scheduler SysEx body (the bytes following the SCHEDULER_DATA
/// sub-command). Requests and unknown sub-commands return `None`.
pub(crate) fn decode_reply(data: &[u8]) -> Option<SchedulerReply> {
    let command = *data.first()?;
    let rest = data.get(1..).unwrap_or_default();

    match command {
        SCHEDULER_QUERY_ALL_TASKS_REPLY => Some(SchedulerReply::QueryAllReply {
            ids: rest.to_vec(),
        }),
        SCHEDULER_QUERY_TASK_REPLY => Some(SchedulerReply::QueryOneReply {
            task: decode_task(rest),
        }),
        SCHEDULER_ERROR_TASK_REPLY => Some(SchedulerReply::ErrorReply {
            task: decode_task(rest),
        }),
        _ => None,
    }
}

fn decode_task(data: &[u8]) -> SchedulerTask {
    let id = data.first().copied().unwrap_or(0);
    if data.len() <= 1 {
        return SchedulerTask { id, body: None };
    }

    let unpacked = unpack_from_7bit(&data[1..]);
    let field = |i: usize| unpacked.get(i).copied().unwrap_or(0);
    SchedulerTask {
        id,
        body: Some(SchedulerTaskBody {
            time_ms: u32::from_le_bytes([field(0), field(1), field(2), field(3)]),
            length: u16::from_le_bytes([field(4), field(5)]),
            position: u16::from_le_bytes([field(6), field(7)]),
            messages: unpacked.get(8..).unwrap_or_default().to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::version::ProtocolVersion;

    use super::*;

    #[test]
    fn test_create_and_delete_requests() {
        let session = Session::default();
        assert_eq!(
            session.scheduler_create_task(3, 200),
            vec![0xF0, 0x7B, 0x00, 0x03, 0x48, 0x01, 0xF7]
        );
        assert_eq!(
            session.scheduler_delete_task(3),
            vec![0xF0, 0x7B, 0x01, 0x03, 0xF7]
        );
    }

    #[test]
    fn test_add_to_task_packs_messages() {
        let session = Session::default();
        let messages = [0x91, 0x7F, 0x01];
        let bytes = session.scheduler_add_to_task(3, &messages);

        let mut expected = vec![0xF0, 0x7B, 0x02, 0x03];
        expected.extend(pack_as_7bit(&messages));
        expected.push(0xF7);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_schedule_and_delay_requests() {
        let session = Session::default();

        let bytes = session.scheduler_schedule_task(3, 5000);
        let mut expected = vec![0xF0, 0x7B, 0x04, 0x03];
        expected.extend(pack_as_7bit(&5000u32.to_le_bytes()));
        expected.push(0xF7);
        assert_eq!(bytes, expected);

        let bytes = session.scheduler_delay(1000);
        let mut expected = vec![0xF0, 0x7B, 0x03];
        expected.extend(pack_as_7bit(&1000u32.to_le_bytes()));
        expected.push(0xF7);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_query_and_reset_requests() {
        let session = Session::default();
        assert_eq!(
            session.scheduler_query_all_tasks(),
            vec![0xF0, 0x7B, 0x05, 0xF7]
        );
        assert_eq!(
            session.scheduler_query_task(3),
            vec![0xF0, 0x7B, 0x06, 0x03, 0xF7]
        );
        assert_eq!(session.scheduler_reset(), vec![0xF0, 0x7B, 0x07, 0xF7]);
    }

    #[test]
    fn test_requests_gated_by_vocabulary() {
        let session = Session::new(ProtocolVersion::V2_02);
        assert!(session.scheduler_reset().is_empty());
    }

    #[test]
    fn test_query_all_reply() {
        assert_eq!(
            decode_reply(&[SCHEDULER_QUERY_ALL_TASKS_REPLY, 1, 4, 7]),
            Some(SchedulerReply::QueryAllReply { ids: vec![1, 4, 7] })
        );
    }

    #[test]
    fn test_query_one_reply_short_form() {
        assert_eq!(
            decode_reply(&[SCHEDULER_QUERY_TASK_REPLY, 4]),
            Some(SchedulerReply::QueryOneReply {
                task: SchedulerTask { id: 4, body: None }
            })
        );
    }

    #[test]
    fn test_query_one_reply_long_form() {
        let mut body = Vec::new();
        body.extend(5000u32.to_le_bytes());
        body.extend(64u16.to_le_bytes());
        body.extend(12u16.to_le_bytes());
        body.extend([0x91, 0x7F, 0x01]);

        let mut payload = vec![SCHEDULER_QUERY_TASK_REPLY, 4];
        payload.extend(pack_as_7bit(&body));

        let reply = decode_reply(&payload).unwrap();
        match reply {
            SchedulerReply::QueryOneReply { task } => {
                assert_eq!(task.id, 4);
                let body = task.body.expect("long form carries a body");
                assert_eq!(body.time_ms, 5000);
                assert_eq!(body.length, 64);
                assert_eq!(body.position, 12);
                assert_eq!(&body.messages[..3], &[0x91, 0x7F, 0x01]);
                assert!(body.messages.len() <= 4, "at most the unpack padding trails");
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_error_reply() {
        assert_eq!(
            decode_reply(&[SCHEDULER_ERROR_TASK_REPLY, 9]),
            Some(SchedulerReply::ErrorReply {
                task: SchedulerTask { id: 9, body: None }
            })
        );
    }

    #[test]
    fn test_requests_decode_to_none() {
        assert_eq!(decode_reply(&[SCHEDULER_CREATE_TASK, 1, 10, 0]), None);
        assert_eq!(decode_reply(&[]), None);
    }
}
