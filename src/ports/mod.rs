use crate::domain::highlight::GraphView;

/// Backend that turns a node/edge description into a visual artifact.
pub trait GraphRenderer {
    fn render(&self, name: &str, view: &GraphView) -> anyhow::Result<()>;
}

/// Table/UI collaborator. Row selection is routed back by the caller
/// through `Session::on_row_selected`.
pub trait TableView {
    fn show(&self, columns: &[String], rows: &[Vec<String>]) -> anyhow::Result<()>;
}
