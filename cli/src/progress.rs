use crossbeam_channel::Sender;
use engine::{Job, JobListener, JobProgress, JobState};

/// Lifecycle events forwarded from the worker thread.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Started {
        job_id: String,
        label: String,
    },
    Progress(JobProgress),
    Finished {
        job_id: String,
        state: JobState,
        failed: usize,
        canceled: bool,
    },
}

/// A JobListener that sends events to the main thread via a channel.
pub struct ChannelListener {
    sender: Sender<JobEvent>,
}

impl ChannelListener {
    pub fn new(sender: Sender<JobEvent>) -> Self {
        ChannelListener { sender }
    }
}

impl JobListener for ChannelListener {
    fn on_start(&self, job: &Job) {
        let _ = self.sender.send(JobEvent::Started {
            job_id: job.id().to_string(),
            label: job.progress_builder().title.clone(),
        });
    }

    fn on_finished(&self, job: &Job) {
        let _ = self.sender.send(JobEvent::Finished {
            job_id: job.id().to_string(),
            state: job.state(),
            failed: job.failed_files().len(),
            canceled: job.is_canceled(),
        });
    }

    fn on_progress(&self, progress: &JobProgress) {
        let _ = self.sender.send(JobEvent::Progress(progress.clone()));
    }
}
