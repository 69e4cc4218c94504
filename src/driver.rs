//! Typed invocation surface and benchmark driver.
//!
//! Argument parsing, file loading and wall-clock reporting live outside;
//! this module owns the compatibility matrix, dispatches construction onto
//! the right store, optionally traverses, and reports counts and memory.

use crate::build::{mccreight, pwotd, ukkonen};
use crate::edgemap::{Collision, DEFAULT_HASH_FUNCTIONS};
use crate::error::{Error, Result};
use crate::store::{ArrayStore, HashStore, ListStore, MemoryUse, Store};
use crate::text::Text;
use crate::walk::{walk_array, walk_store, Sink, Traversal, Visit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Sibling linked lists (LL).
    List,
    /// Edge hash table (HT).
    Hash,
    /// Linear array (LA).
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    SimpleMcCreight,
    McCreight,
    SimpleUkkonen,
    Ukkonen,
    Pwotd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variation {
    #[default]
    Default,
    BackwardPointers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Benchmark {
    #[default]
    ConstructOnly,
    ConstructTraverseDelete,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub store: StoreKind,
    pub algorithm: Algorithm,
    pub variation: Variation,
    pub benchmark: Benchmark,
    pub traversal: Traversal,
    /// Hash-table stores only.
    pub collision: Option<Collision>,
    /// Cuckoo hash-table stores only.
    pub cuckoo_hash_functions: Option<u32>,
    /// PWOTD only.
    pub prefix_length: Option<u32>,
}

impl Options {
    pub fn new(store: StoreKind, algorithm: Algorithm) -> Options {
        Options {
            store,
            algorithm,
            variation: Variation::default(),
            benchmark: Benchmark::default(),
            traversal: Traversal::default(),
            collision: None,
            cuckoo_hash_functions: None,
            prefix_length: None,
        }
    }

    /// Enforces the compatibility matrix.
    pub fn validate(&self) -> Result<()> {
        let config = |message: &str| Err(Error::Config(message.to_string()));
        match (self.store, self.algorithm) {
            (StoreKind::Array, Algorithm::Pwotd) => {}
            (StoreKind::Array, _) => return config("the linear array is built by PWOTD only"),
            (_, Algorithm::Pwotd) => return config("PWOTD builds only the linear array"),
            _ => {}
        }
        if self.variation == Variation::BackwardPointers
            && !matches!(self.algorithm, Algorithm::McCreight | Algorithm::Ukkonen)
        {
            return config("backward pointers go with linked McCreight or Ukkonen only");
        }
        if self.prefix_length.is_some() && self.algorithm != Algorithm::Pwotd {
            return config("a prefix length is a PWOTD option");
        }
        if self.store != StoreKind::Hash {
            if self.collision.is_some() {
                return config("collision resolution is a hash-table option");
            }
            if self.cuckoo_hash_functions.is_some() {
                return config("the hash-function count is a hash-table option");
            }
        }
        if self.cuckoo_hash_functions == Some(0) {
            return config("at least one cuckoo hash function is required");
        }
        if self.cuckoo_hash_functions.is_some() && self.collision == Some(Collision::DoubleHash) {
            return config("the hash-function count is a cuckoo option");
        }
        if self.store == StoreKind::Array && self.traversal == Traversal::Detailed {
            return config("the linear array supports simple traversal only");
        }
        Ok(())
    }
}

/// A finished tree in whichever layout was requested.
pub enum Tree {
    List(ListStore),
    Hash(HashStore),
    Array(ArrayStore),
}

impl Tree {
    pub fn leaf_count(&self) -> u32 {
        match self {
            Tree::List(s) => s.leaf_count(),
            Tree::Hash(s) => s.leaf_count(),
            Tree::Array(s) => s.leaf_count(),
        }
    }

    pub fn branch_count(&self) -> u32 {
        match self {
            Tree::List(s) => s.branch_count(),
            Tree::Hash(s) => s.branch_count(),
            Tree::Array(s) => s.branch_count(),
        }
    }

    pub fn memory(&self) -> MemoryUse {
        match self {
            Tree::List(s) => s.memory(),
            Tree::Hash(s) => s.memory(),
            Tree::Array(s) => s.memory(),
        }
    }

    pub fn traverse(&self, text: &Text, mode: Traversal, visit: &mut dyn Visit) {
        match self {
            Tree::List(s) => walk_store(s, text, mode, visit),
            Tree::Hash(s) => walk_store(s, text, mode, visit),
            Tree::Array(s) => walk_array(s, text, visit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub leaves: u32,
    pub branches: u32,
    pub memory: MemoryUse,
}

/// Builds the tree for a validated configuration.
pub fn construct(text: &Text, options: &Options) -> Result<Tree> {
    options.validate()?;
    let backward = options.variation == Variation::BackwardPointers;
    match options.store {
        StoreKind::List => {
            let mut store = ListStore::allocate(text.n(), backward)?;
            drive(&mut store, text, options.algorithm)?;
            Ok(Tree::List(store))
        }
        StoreKind::Hash => {
            let mut store = HashStore::allocate(
                text.n(),
                backward,
                options.collision.unwrap_or_default(),
                options.cuckoo_hash_functions.unwrap_or(DEFAULT_HASH_FUNCTIONS),
            )?;
            drive(&mut store, text, options.algorithm)?;
            Ok(Tree::Hash(store))
        }
        StoreKind::Array => {
            let mut store = ArrayStore::allocate(text.n())?;
            pwotd::build(&mut store, text, options.prefix_length)?;
            Ok(Tree::Array(store))
        }
    }
}

fn drive<S: Store + ?Sized>(store: &mut S, text: &Text, algorithm: Algorithm) -> Result<()> {
    match algorithm {
        Algorithm::SimpleMcCreight => mccreight::simple(store, text),
        Algorithm::McCreight => mccreight::linked(store, text),
        Algorithm::SimpleUkkonen => ukkonen::simple(store, text),
        Algorithm::Ukkonen => ukkonen::linked(store, text),
        Algorithm::Pwotd => Err(Error::Config(
            "PWOTD builds only the linear array".to_string(),
        )),
    }
}

/// Constructs, optionally traverses, releases, and reports.
pub fn run(text: &Text, options: &Options, visit: Option<&mut dyn Visit>) -> Result<Report> {
    let tree = construct(text, options)?;
    if options.benchmark == Benchmark::ConstructTraverseDelete {
        let mut sink = Sink;
        match visit {
            Some(v) => tree.traverse(text, options.traversal, v),
            None => tree.traverse(text, options.traversal, &mut sink),
        }
    }
    Ok(Report {
        leaves: tree.leaf_count(),
        branches: tree.branch_count(),
        memory: tree.memory(),
    })
}
