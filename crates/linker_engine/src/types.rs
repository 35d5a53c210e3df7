use linker_core::LinkViewModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A step finished; the view's last step is the new one.
    Progress(LinkViewModel),
    /// The run reached `Done` or `Failed`.
    Finished(LinkViewModel),
}
