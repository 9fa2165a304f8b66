/// Codecs for the textual attribute values produced by a PBS job-scheduling
/// system's status/query interface.
///
/// Attribute values arrive as strings in several small grammars: unit-tagged
/// memory sizes, clock durations, delimiter-separated lists and maps, job
/// resource requests (`select`/`schedselect`), the scheduler's allocation
/// solution (`exec_vnode`), the legacy host allocation (`exec_host`), and
/// fine-grained-limit name/value pairs.  This library parses each of those
/// into a structured, queryable value and re-encodes it into a string the
/// same external system accepts, so that parsed-then-modified values can be
/// submitted back in update requests.  Re-encoding is a wire-compatibility
/// requirement, not a display convenience.
///
/// Everything here is pure, synchronous computation; there is no I/O and no
/// shared state, and any number of independent parses can run concurrently.
/// Values that can be modified after parsing (appending a chunkspec to a
/// select, merging resources into a chunk, updating a variable list) keep
/// their string form consistent with their structure, so a value is ready to
/// re-encode after every operation.
///
/// Three inputs are deliberately parsed leniently because dependent systems
/// rely on the defaults (see the module docs for details): a "mem" resource
/// in a select spec whose value is not a size keeps its raw string; an
/// exec_host task/ncpus field with an unexpected segment count defaults to
/// task 0 with one cpu; and a fine-grained-limit name or value that does not
/// match its grammar yields None fields rather than an error.
mod duration;
mod error;
mod exechost;
mod execvnode;
mod fgclimit;
mod list;
mod resources;
mod select;
mod size;

// Error taxonomy: structural problems vs unknown units.  Parse APIs return
// anyhow::Result; use downcast_ref to tell these apart when it matters.

pub use error::FormatError;
pub use error::UnitError;

// Unit-aware memory/size quantities, canonically in kibibytes.

pub use size::SizeUnit;
pub use size::SizeValue;

// [HH:][MM:]SS durations, canonically in seconds.

pub use duration::DurationValue;

// Generic separator-based list and key=value list codecs.

pub use list::DelimitedList;
pub use list::KeyValueList;

// The license-count and variable-list specializations.

pub use list::LicenseCounts;
pub use list::VariableList;

// Insertion-ordered resource-name -> raw-value map used by the select and
// exec_vnode codecs.

pub use resources::ResourceMap;

// Job resource requests: chunk multiplicities plus per-resource aggregation.

pub use select::AggValue;
pub use select::SelectSpec;

// The scheduler's node-allocation solution: parenthesized chunks, with '+'
// inside a group denoting a virtual chunk rather than a separator.

pub use execvnode::Chunk;
pub use execvnode::ExecVnode;

// The legacy host/task/ncpus allocation string.

pub use exechost::ExecHost;
pub use exechost::HostSlot;

// Fine-grained-limit attribute name/value pairs.

pub use fgclimit::FgcLimit;
