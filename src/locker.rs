//! Lockers for RAW data
use crate::error::Result;
use crate::filetime::Filetime;
use crate::frame::FrameReader;
use crate::model::TimeWindow;
use crate::parser::{DatagramKind, Headers, Record};
use std::collections::{btree_map, BTreeMap};
use std::fs::{read_dir, File};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use std::sync::mpsc;
use std::thread;

type LockerKey = (DatagramKind, Filetime);
type LockerValue = Vec<(PathBuf, u64)>;

/// A representation of an on-disk set of RAW files
///
/// A `Locker` contains an in-memory [`BTreeMap`] index that maps
/// keys to the file paths and byte offsets where matching records can
/// be found. Keys are a tuple of the [`DatagramKind`] and the record
/// [`Filetime`], so queries such as finding all RAW0 datagrams between
/// two times are fast. Several records can share a key, e.g. the RAW0
/// datagrams of different channels of one ping.
///
/// The index is built with a header-only pass, one thread per file.
pub struct Locker {
    path: PathBuf,
    tree: BTreeMap<LockerKey, LockerValue>,
}

impl Locker {
    /// Open a locker over every file in the directory at `path`
    ///
    /// This scans through every file and creates an entry in
    /// the locker tree for each record.
    ///
    /// # Errors
    ///
    /// This function returns an error when `read_dir` errors or a file
    /// cannot be scanned.
    pub fn open<P>(path: P) -> Result<Self>
    where
        PathBuf: From<P>,
    {
        let path = PathBuf::from(path);
        let mut files = read_dir(&path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        files.retain(|p| p.is_file());

        let mut locker = Locker {
            path,
            tree: BTreeMap::new(),
        };
        locker.build_index(files)?;
        Ok(locker)
    }

    /// Build a locker over an explicit list of files
    pub fn from_files<I, P>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        PathBuf: From<P>,
    {
        let files = files.into_iter().map(PathBuf::from).collect::<Vec<_>>();
        let path = files
            .first()
            .and_then(|f| f.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut locker = Locker {
            path,
            tree: BTreeMap::new(),
        };
        locker.build_index(files)?;
        Ok(locker)
    }

    fn build_index(&mut self, files: Vec<PathBuf>) -> Result<()> {
        self.tree.clear();

        // Open a channel for storing key-value pairs read out of the files
        let (tx, rx) = mpsc::channel();

        let handles = files
            .into_iter()
            .map(|filepath| {
                let tx1 = tx.clone();
                thread::spawn(move || -> Result<()> {
                    let reader = BufReader::new(File::open(&filepath)?);
                    let mut headers = Headers::new(reader);
                    loop {
                        let pos = headers.position();
                        let header = match headers.next() {
                            Some(val) => val?,
                            None => break,
                        };
                        let key = (header.kind(), header.timestamp);
                        // The receiver outlives every sender
                        if tx1.send((key, (filepath.clone(), pos))).is_err() {
                            break;
                        }
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();

        // Explicitly drop the Sender to close the channel
        drop(tx);

        for (key, value) in rx {
            self.tree.entry(key).or_default().push(value);
        }
        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        for values in self.tree.values_mut() {
            values.sort();
        }

        Ok(())
    }

    /// Return a reference to the path of the locker
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a reference to the underlying [`BTreeMap`]
    pub fn tree(&self) -> &BTreeMap<LockerKey, LockerValue> {
        &self.tree
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }

    /// Whether no records are indexed
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Get an iterator over the entries of the locker, sorted by key
    pub fn iter(&self) -> Iter {
        let iter = self.tree.iter();
        Iter { iter }
    }

    /// The entries of one kind inside a time window
    ///
    /// An inverted window selects nothing.
    pub fn range(
        &self,
        kind: DatagramKind,
        window: TimeWindow,
    ) -> btree_map::Range<'_, LockerKey, LockerValue> {
        if window.start > window.end {
            return self.tree.range((kind, window.start)..(kind, window.start));
        }
        self.tree.range((kind, window.start)..=(kind, window.end))
    }

    /// Read every record stored under `key`
    ///
    /// # Errors
    ///
    /// This method returns an error if the key is not found in the index tree or
    /// if there is an error reading a record from its file.
    pub fn get(&self, key: &LockerKey) -> Result<Vec<Record>> {
        let values = self.tree.get(key).ok_or(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Key not found",
        ))?;
        values
            .iter()
            .map(|(path, offset)| read_record_at(path, *offset))
            .collect()
    }
}

/// Read the record starting at `offset` in the file at `path`
pub fn read_record_at<P: AsRef<Path>>(path: P, offset: u64) -> Result<Record> {
    let mut f = File::open(path)?;
    f.seek(SeekFrom::Start(offset))?;
    let mut frames = FrameReader::new(BufReader::new(f));
    frames.next_with(Record::from_body).unwrap_or_else(|| {
        Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "No record at offset",
        )
        .into())
    })
}

/// An iterator over the entries of the locker
///
/// This should be created by calling `iter` on a `Locker`.
pub struct Iter<'a> {
    iter: btree_map::Iter<'a, LockerKey, LockerValue>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a LockerKey, &'a LockerValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}
