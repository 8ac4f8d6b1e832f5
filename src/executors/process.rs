// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Process launcher
//!
//! Spawns one stage with all three standard streams piped. Feeding stdin and
//! draining stdout/stderr happen on helper tasks so a child that fills a
//! pipe never blocks waiting on us.

use std::io;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use super::StageOutput;
use crate::pipeline::Stage;

/// A running stage process
pub struct SpawnedProcess {
    child: Child,
    stdin: JoinHandle<io::Result<()>>,
    stdout: JoinHandle<io::Result<Vec<u8>>>,
    stderr: JoinHandle<io::Result<Vec<u8>>>,
    started: Instant,
}

impl SpawnedProcess {
    /// Start `stage`, feeding it `input` on stdin
    pub fn spawn(stage: &Stage, input: Vec<u8>) -> io::Result<Self> {
        let mut cmd = Command::new(stage.program());
        cmd.args(stage.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd.spawn()?;

        let stdin = tokio::spawn(feed(child.stdin.take(), input));
        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            started,
        })
    }

    /// OS process id, while the child is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit and collect everything it wrote
    ///
    /// Cancel-safe: dropping the future leaves the process running and
    /// killable through [`SpawnedProcess::kill`].
    pub async fn finish(&mut self) -> io::Result<StageOutput> {
        let status = self.child.wait().await?;

        join(&mut self.stdin).await?;
        let stdout = join(&mut self.stdout).await?;
        let stderr = join(&mut self.stderr).await?;

        Ok(StageOutput {
            stdout,
            stderr,
            status,
            duration: self.started.elapsed(),
        })
    }

    /// Kill the process and reap it
    pub async fn kill(&mut self) -> io::Result<()> {
        let result = self.child.kill().await;

        self.stdin.abort();
        self.stdout.abort();
        self.stderr.abort();

        result
    }
}

async fn feed(stdin: Option<ChildStdin>, input: Vec<u8>) -> io::Result<()> {
    let Some(mut pipe) = stdin else {
        return Ok(());
    };

    // Dropping the pipe on return closes the child's stdin.
    match pipe.write_all(&input).await {
        // The child exited without reading all of its input.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}

async fn drain<R>(reader: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn join<T>(handle: &mut JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle.await.map_err(io::Error::other)?
}
