pub mod adl;
pub mod experiment;
pub mod frameworkcontroller;
pub mod kubeflow;
pub mod kubernetes;
pub mod storage;
