pub mod core;
pub mod storage;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod compression;
pub mod source;
pub mod parallel;
pub mod build;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                               GNINDEX BUILD ARCHITECTURE                                   │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── BUILD LAYER ────────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                            struct IndexBuilder                                      │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ config: BuildConfig                 // batch size, workers, fan-in, retry    │ │    │
│  │  │ records: &mut dyn RecordSource      // MySqlSource | MemorySource            │ │    │
│  │  │ annotations: &dyn AnnotationSource  // SparqlSource | StaticAnnotations      │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ensure_empty(dest) ─► Fingerprint::compute ─► AnnotationCache (Arc, read-only)             │
│        │                                                                                     │
│        ▼                                                                                     │
│  for kind in [Gene, Phenotype]:                                                              │
│     RecordSource::stream(query, offset) ─► Chunker ─► WorkerPool::dispatch(ShardJob)        │
│        ▲                                                   │                                 │
│        └── reconnect + resume at cursor.offset ◄── Disconnected                              │
│                                                                                              │
│  WorkerPool::drain() (barrier) ─► Compactor::compact ─► Fingerprint::write_to ─► publish    │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── SHARD LAYER ────────────────────────────────────────────┐
│                                                                                              │
│  ┌──────────────────────────┐  ┌──────────────────────────┐  ┌──────────────────────────┐  │
│  │ struct ShardJob          │  │ struct DocumentMapper    │  │ struct TermGenerator     │  │
│  │ • kind, chunk, path      │  │ • schema: &RecordSchema  │  │ • analyzer: Analyzer     │  │
│  │ • records: Vec<Record>   │  │ • annotations: &Cache    │  │ • stemmer: Stemmer       │  │
│  │ • annotations: Arc<..>   │  │ • termgen (per worker)   │  │ • termpos: u32           │  │
│  │ • commit_lock: CommitLock│  └──────────────────────────┘  └──────────────────────────┘  │
│  └──────────────────────────┘                                                               │
│   index_shard: create ─► begin_transaction ─► replace_document* ─► prepare ─► lock ─► write│
│                                  └──── on error: cancel_transaction + remove shard dir      │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── STORAGE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  <dir>/index.seg                                                                            │
│  ┌──────────────────────────────────────────┐ ┌─────────────────────────────────────────┐  │
│  │ SegmentHeader (32 bytes, bincode)        │ │ SegmentBody (bincode, LZ4)              │  │
│  │ • version, doc_count                     │ │ • documents: Vec<StoredDocument>        │  │
│  │ • checksum (crc32 of body)               │ │ • terms: fst::Map  term -> posting idx  │  │
│  │ • compression, body_len, raw_len         │ │ • postings: Vec<PostingList>            │  │
│  └──────────────────────────────────────────┘ │ • metadata: tables/checksums/generif    │  │
│                                                └─────────────────────────────────────────┘  │
│  <dir>/.lock  flock held by each WritableDatabase                                           │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
