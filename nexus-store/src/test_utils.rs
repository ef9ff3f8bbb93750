// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures for tests against document stores.
use nexus_core::{
    AccessCode, EntityDetails, NewEntity, Principal, PrincipalId, ProjectDetails, Role,
};

/// Principal record with student role and the id as display name.
pub fn student(id: &str) -> Principal {
    Principal::new(PrincipalId::from(id), Some(id.to_string()), None)
}

/// Principal record with teacher role and the id as display name.
pub fn teacher(id: &str) -> Principal {
    student(id).with_role(Role::Teacher)
}

fn new_entity(owner: &str, code: &str, details: EntityDetails) -> NewEntity {
    NewEntity {
        owner_id: PrincipalId::from(owner),
        owner_name: owner.to_string(),
        access_code: AccessCode::normalize(code).expect("non-empty code"),
        details,
    }
}

pub fn new_resource(owner: &str, code: &str) -> NewEntity {
    new_entity(
        owner,
        code,
        EntityDetails::Resource {
            name: "Operating Systems".into(),
            subject: "Computer Science".into(),
            description: "Processes, memory and file systems".into(),
        },
    )
}

pub fn new_course(owner: &str, code: &str) -> NewEntity {
    new_entity(
        owner,
        code,
        EntityDetails::Course {
            title: "Compilers".into(),
            description: "From tokens to machine code".into(),
        },
    )
}

pub fn new_project(owner: &str, code: &str) -> NewEntity {
    new_entity(
        owner,
        code,
        EntityDetails::Project(ProjectDetails {
            title: "Campus Rover".into(),
            description: "Autonomous delivery robot".into(),
            category: "Robotics".into(),
            tech: vec!["Rust".into(), "ROS".into()],
            ..Default::default()
        }),
    )
}
