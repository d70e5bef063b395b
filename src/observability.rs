use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("groqchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("groqchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("groqchat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("groqchat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("groqchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("groqchat.stream.bytes");

pub(crate) static CONVERSATION_TURNS: Counter = Counter::new("groqchat.conversation.turns");
pub(crate) static CONVERSATION_TURN_FAILURES: Counter =
    Counter::new("groqchat.conversation.turn_failures");

pub(crate) static MEMORY_SUMMARIZATIONS: Counter = Counter::new("groqchat.memory.summarizations");
pub(crate) static MEMORY_SUMMARIZATION_ERRORS: Counter =
    Counter::new("groqchat.memory.summarization_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CONVERSATION_TURNS);
    collector.register_counter(&CONVERSATION_TURN_FAILURES);

    collector.register_counter(&MEMORY_SUMMARIZATIONS);
    collector.register_counter(&MEMORY_SUMMARIZATION_ERRORS);
}
