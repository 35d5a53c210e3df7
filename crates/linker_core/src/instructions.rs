use crate::RemoteStatus;

/// Step-by-step guidance shown before a run, chosen by what the remote looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionSet {
    NewRepository,
    ExistingRepository,
}

impl InstructionSet {
    pub fn for_status(status: &RemoteStatus) -> Self {
        if status.needs_publish() {
            InstructionSet::NewRepository
        } else {
            InstructionSet::ExistingRepository
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            InstructionSet::NewRepository => "Create a new repository on GitHub",
            InstructionSet::ExistingRepository => "Link to an existing repository",
        }
    }

    pub fn steps(self) -> &'static [&'static str] {
        match self {
            InstructionSet::NewRepository => &[
                "Sign in to your GitHub account.",
                "Click '+' in the top right corner and choose 'New repository'.",
                "Enter a name for the repository.",
                "Optionally add a description.",
                "Choose whether the repository is public or private.",
                "Do NOT initialize it with a README, .gitignore or license.",
                "Click 'Create repository'.",
                "Copy the repository URL (ending in .git) or use owner/name with repo-linker.",
            ],
            InstructionSet::ExistingRepository => &[
                "Make sure the repository already exists on GitHub.",
                "Copy the repository URL (ending in .git) from the repository page.",
                "Pass the URL or owner/name to repo-linker.",
            ],
        }
    }

    pub fn note(self) -> &'static str {
        match self {
            InstructionSet::NewRepository => {
                "Once the repository exists, run the link to publish this folder as its first commit."
            }
            InstructionSet::ExistingRepository => {
                "If the repository is not empty you may need to resolve conflicts by hand before pushing."
            }
        }
    }
}
