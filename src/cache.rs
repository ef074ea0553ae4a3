//! Memoization of scan results.
//!
//! Every [`Definition`][crate::Definition] owns a [`ScanCache`].
//! By default this is an unbounded [`MemoryCache`],
//! but any implementation can be injected with [`Definition::with_cache()`][crate::Definition::with_cache].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ScanResult;

/// Storage for scan results, keyed by the exact template text.
///
/// Implementations must never expose a partially written entry.
pub trait ScanCache: Send + Sync {
	/// Get the cached scan result of a template.
	fn get(&self, template: &str) -> Option<Arc<ScanResult>>;

	/// Store the scan result of a template, unless an entry already exists.
	///
	/// Returns the entry that ended up in the cache,
	/// which is the existing one if another caller stored a result first.
	fn insert(&self, template: &str, result: Arc<ScanResult>) -> Arc<ScanResult>;

	/// Evict the entry for a template, if present.
	fn remove(&self, template: &str);

	/// Evict all entries.
	fn clear(&self);
}

/// An unbounded in-memory cache that can be shared between threads.
#[derive(Debug, Default)]
pub struct MemoryCache {
	entries: RwLock<HashMap<Box<str>, Arc<ScanResult>>>,
}

impl MemoryCache {
	/// Create a new, empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the number of cached templates.
	pub fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	/// Check if the cache is empty.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

// Entries are immutable once inserted, so a poisoned lock still guards consistent data.
impl ScanCache for MemoryCache {
	fn get(&self, template: &str) -> Option<Arc<ScanResult>> {
		let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
		entries.get(template).cloned()
	}

	fn insert(&self, template: &str, result: Arc<ScanResult>) -> Arc<ScanResult> {
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		entries.entry(template.into()).or_insert(result).clone()
	}

	fn remove(&self, template: &str) {
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		entries.remove(template);
	}

	fn clear(&self) {
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		entries.clear();
	}
}

/// A cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ScanCache for NoCache {
	#[inline]
	fn get(&self, _template: &str) -> Option<Arc<ScanResult>> {
		None
	}

	#[inline]
	fn insert(&self, _template: &str, result: Arc<ScanResult>) -> Arc<ScanResult> {
		result
	}

	#[inline]
	fn remove(&self, _template: &str) {}

	#[inline]
	fn clear(&self) {}
}

impl<T: ScanCache + ?Sized> ScanCache for Arc<T> {
	#[inline]
	fn get(&self, template: &str) -> Option<Arc<ScanResult>> {
		T::get(self, template)
	}

	#[inline]
	fn insert(&self, template: &str, result: Arc<ScanResult>) -> Arc<ScanResult> {
		T::insert(self, template, result)
	}

	#[inline]
	fn remove(&self, template: &str) {
		T::remove(self, template)
	}

	#[inline]
	fn clear(&self) {
		T::clear(self)
	}
}
