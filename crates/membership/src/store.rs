use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use {
    jirabot_common::RoomId,
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// File-backed set of joined rooms.
///
/// The in-memory set is only touched after the corresponding disk write has
/// been synced, so both always agree once a call returns `Ok`.
pub struct MembershipStore {
    path: PathBuf,
    rooms: Vec<RoomId>,
    index: HashSet<RoomId>,
}

impl MembershipStore {
    /// Load the ledger at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rooms = read_rooms(&path)?;
        let index = rooms.iter().cloned().collect();
        debug!(path = %path.display(), rooms = rooms.len(), "loaded membership ledger");
        Ok(Self { path, rooms, index })
    }

    /// Re-read the ledger from disk, replacing the in-memory set.
    pub fn reload(&mut self) -> Result<()> {
        let rooms = read_rooms(&self.path)?;
        self.index = rooms.iter().cloned().collect();
        self.rooms = rooms;
        Ok(())
    }

    pub fn contains(&self, room: &str) -> bool {
        self.index.contains(room)
    }

    /// Record a room. Returns `false` if it was already present.
    pub fn add(&mut self, room: &RoomId) -> Result<bool> {
        validate_room_id(room)?;
        if self.contains(room.as_str()) {
            return Ok(false);
        }
        self.append_line(room)?;
        self.rooms.push(room.clone());
        self.index.insert(room.clone());
        info!(room = %room, "room recorded in membership ledger");
        Ok(true)
    }

    /// Forget a room. Returns `false` if it was not present.
    pub fn remove(&mut self, room: &RoomId) -> Result<bool> {
        if !self.contains(room.as_str()) {
            return Ok(false);
        }
        let remaining: Vec<RoomId> = self.rooms.iter().filter(|r| *r != room).cloned().collect();
        self.rewrite(&remaining)?;
        self.rooms = remaining;
        self.index.remove(room.as_str());
        info!(room = %room, "room removed from membership ledger");
        Ok(true)
    }

    /// Rooms in insertion order.
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, room: &RoomId) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)
            .map_err(|e| Error::storage("open", &self.path, e))?;

        let mut line = String::with_capacity(room.as_str().len() + 2);
        if !ends_with_newline(&mut file).map_err(|e| Error::storage("read", &self.path, e))? {
            // Torn previous write: never glue the new entry onto it.
            line.push('\n');
        }
        line.push_str(room.as_str());
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| Error::storage("append to", &self.path, e))
    }

    /// Write the full ledger to a temp sibling and rename it into place.
    fn rewrite(&self, rooms: &[RoomId]) -> Result<()> {
        ensure_parent(&self.path)?;
        let tmp = tmp_path(&self.path);
        let mut payload = String::new();
        for room in rooms {
            payload.push_str(room.as_str());
            payload.push('\n');
        }

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(Error::storage("write", &tmp, e));
        }
        fs::rename(&tmp, &self.path).map_err(|e| Error::storage("replace", &self.path, e))
    }
}

fn read_rooms(path: &Path) -> Result<Vec<RoomId>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::storage("read", path, e)),
    };

    let mut seen = HashSet::new();
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(RoomId::from)
        .collect())
}

fn validate_room_id(room: &RoomId) -> Result<()> {
    let raw = room.as_str();
    let reason = if raw.is_empty() {
        "empty"
    } else if raw.contains(['\n', '\r']) {
        "contains a line break"
    } else if raw.trim() != raw {
        "has surrounding whitespace"
    } else {
        return Ok(());
    };
    Err(Error::InvalidRoomId {
        room: raw.to_string(),
        reason,
    })
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::storage("create", parent, e))?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "membership".into());
    name.push(".tmp");
    path.with_file_name(name)
}
