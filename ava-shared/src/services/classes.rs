//! Class management

use std::sync::Arc;
use tracing::info;

use crate::{
    error::{ServiceError, ServiceResult},
    models::class::{Class, ClassInput},
    repository::{ClassRepository, RepositoryError},
};

/// Class operations
#[derive(Clone)]
pub struct ClassService {
    classes: Arc<dyn ClassRepository>,
}

impl ClassService {
    pub fn new(classes: Arc<dyn ClassRepository>) -> Self {
        Self { classes }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Class>> {
        Ok(self.classes.list().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Class> {
        self.classes.get_by_id(id).await.map_err(class_error)
    }

    /// Creates a class with a unique name
    pub async fn create(&self, input: ClassInput) -> ServiceResult<Class> {
        let input = normalize(input)?;
        self.ensure_name_free(&input.name, None).await?;

        let class = self.classes.create(input).await.map_err(class_error)?;
        info!(class_id = class.id, name = %class.name, "Class created");
        Ok(class)
    }

    /// Replaces every field of an existing class
    pub async fn update(&self, id: i64, input: ClassInput) -> ServiceResult<Class> {
        let input = normalize(input)?;
        self.ensure_name_free(&input.name, Some(id)).await?;

        let class = self.classes.update(id, input).await.map_err(class_error)?;
        info!(class_id = class.id, "Class updated");
        Ok(class)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.classes.delete(id).await.map_err(class_error)?;
        info!(class_id = id, "Class deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, owner: Option<i64>) -> ServiceResult<()> {
        match self.classes.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ServiceError::Conflict("class name already in use".to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn normalize(mut input: ClassInput) -> ServiceResult<ClassInput> {
    input.name = input.name.trim().to_string();
    input.validate().map_err(ServiceError::Validation)?;
    Ok(input)
}

fn class_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound("class not found".to_string()),
        RepositoryError::Conflict(_) => ServiceError::Conflict("class name already in use".to_string()),
        other => other.into(),
    }
}
