//! Process-wide codec memoisation.
//!
//! Every type that can describe its own codec implements [`Derive`]. The
//! cache derives each codec once, publishes it, and hands out shared
//! references afterwards. While a type is being derived it sits in a
//! per-thread generating set, so a type whose derivation needs itself fails
//! with [`BuildError::CyclicDefinition`] instead of recursing forever.
//!
//! Two threads racing on the same type both derive it; the first one to
//! publish wins and the loser adopts the winner's codec.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::codec::{Codec, ListCodec, MapCodec, PrimitiveCodec, short_type_name};
use crate::error::BuildError;

/// A type with a canonical codec.
///
/// Asking the cache for a type without an implementation does not compile,
/// which is how unsupported types are rejected.
pub trait Derive: Sized + 'static {
    type Codec: Codec<Value = Self> + 'static;

    /// Builds the codec, resolving component codecs through `cache`.
    fn derive(cache: &CodecCache) -> Result<Self::Codec, BuildError>;
}

type Erased = Arc<dyn Any + Send + Sync>;

pub struct CodecCache {
    codecs: RwLock<HashMap<TypeId, Erased>>,
    generating: Mutex<HashSet<(ThreadId, TypeId)>>,
}

static GLOBAL: Lazy<CodecCache> = Lazy::new(CodecCache::new);

/// Looks `T` up in the global cache, deriving it on first use.
pub fn find<T: Derive>() -> Result<Arc<T::Codec>, BuildError> {
    CodecCache::global().find::<T>()
}

impl CodecCache {
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
            generating: Mutex::new(HashSet::new()),
        }
    }

    pub fn global() -> &'static CodecCache {
        &GLOBAL
    }

    /// The published codec for `T`, if any. Never derives.
    pub fn get<T: Derive>(&self) -> Option<Arc<T::Codec>> {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|codec| codec.downcast::<T::Codec>().ok())
    }

    pub fn find<T: Derive>(&self) -> Result<Arc<T::Codec>, BuildError> {
        if let Some(codec) = self.get::<T>() {
            tracing::trace!(ty = short_type_name::<T>(), "codec cache hit");
            return Ok(codec);
        }
        let _generating = self.enter::<T>()?;
        tracing::debug!(ty = short_type_name::<T>(), "deriving codec");
        let codec = T::derive(self)?;
        Ok(self.put::<T>(codec))
    }

    /// Publishes `codec` unless another caller got there first, in which
    /// case the earlier codec is returned and `codec` is dropped.
    pub fn put<T: Derive>(&self, codec: T::Codec) -> Arc<T::Codec> {
        let key = TypeId::of::<T>();
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        let existing = codecs
            .get(&key)
            .cloned()
            .and_then(|codec| codec.downcast::<T::Codec>().ok());
        if let Some(existing) = existing {
            tracing::debug!(ty = short_type_name::<T>(), "codec already published");
            return existing;
        }
        let codec = Arc::new(codec);
        codecs.insert(key, codec.clone());
        tracing::debug!(ty = short_type_name::<T>(), "codec published");
        codec
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.codecs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enter<T: 'static>(&self) -> Result<Generating<'_>, BuildError> {
        let key = (thread::current().id(), TypeId::of::<T>());
        let mut generating = self.generating.lock().unwrap_or_else(PoisonError::into_inner);
        if !generating.insert(key) {
            tracing::error!(ty = short_type_name::<T>(), "cyclic codec definition");
            return Err(BuildError::CyclicDefinition(short_type_name::<T>()));
        }
        Ok(Generating { cache: self, key })
    }
}

impl Default for CodecCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecCache").field("codecs", &self.len()).finish()
    }
}

/// Removes its type from the generating set on drop, on success and failure alike.
struct Generating<'a> {
    cache: &'a CodecCache,
    key: (ThreadId, TypeId),
}

impl Drop for Generating<'_> {
    fn drop(&mut self) {
        self.cache
            .generating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

// ------------------------------ Derivations ------------------------------ //

macro_rules! derive_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Derive for $ty {
                type Codec = PrimitiveCodec<$ty>;

                fn derive(_: &CodecCache) -> Result<Self::Codec, BuildError> {
                    Ok(PrimitiveCodec::new())
                }
            }
        )*
    };
}

derive_primitive!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, String);

impl<T: Derive> Derive for Vec<T> {
    type Codec = ListCodec<Arc<T::Codec>>;

    fn derive(cache: &CodecCache) -> Result<Self::Codec, BuildError> {
        Ok(ListCodec::new(cache.find::<T>()?))
    }
}

impl<K, V> Derive for IndexMap<K, V>
where
    K: Derive + Hash + Eq + Debug,
    V: Derive,
{
    type Codec = MapCodec<Arc<K::Codec>, Arc<V::Codec>>;

    fn derive(cache: &CodecCache) -> Result<Self::Codec, BuildError> {
        Ok(MapCodec::new(cache.find::<K>()?, cache.find::<V>()?))
    }
}
