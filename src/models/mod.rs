// Domain models: backend instances and the records they report

mod instance;
mod status;

pub use instance::{ApiKind, BackendInstance, Protocol, UnsupportedApiKind};
pub use status::{
    ColumnMapping, LAST_STATE_CHANGE, SERVICES, StateMapping, StatusRecord, TAG, TransportStat,
    TransportStats, columns, value_as_i64,
};
