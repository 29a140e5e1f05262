use kube::core::CustomResourceExt;
use oprc_dbaas::crd::{
    connection::DBaaSConnection, inventory::DBaaSInventory,
    provider::DBaaSProvider,
};

fn main() {
    let crds = [
        DBaaSProvider::crd(),
        DBaaSInventory::crd(),
        DBaaSConnection::crd(),
    ];
    for crd in crds {
        let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
        println!("---\n{}", yaml);
    }
}
