use crate::runtime::error::IrError;
use miette::Report;

pub fn report_error(error: &IrError) {
    eprintln!("{:?}", Report::new(error.clone()));
}
