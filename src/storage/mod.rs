//! On-disk structures inside the arena.

/// Allocator header, block address table, directory and free list.
pub mod allocator;

/// The record B-tree.
pub mod btree;

/// Free space analysis over the allocator free list.
pub mod freespace;

/// Property records and their payloads.
pub mod record;
