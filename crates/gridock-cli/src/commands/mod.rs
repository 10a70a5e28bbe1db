pub mod angles;
pub mod dock;
